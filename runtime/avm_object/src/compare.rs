//! Coercions and the `==` / `<` operators.
//!
//! Primitives compare by value. Other objects may overload equality with a
//! script `equals` member or expose a primitive through `valueOf`; both are
//! looked up in the public namespace.

use avm_names::{Name, Namespace};

use crate::{ObjectError, ObjectHeap, ObjectId, ObjectKind, ObjectResult, ObjectTag};

const TWO_32: f64 = 4_294_967_296.0;
const TWO_31: f64 = 2_147_483_648.0;

/// ECMAScript `ToInt32`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the value is reduced into i32 range before the cast"
)]
fn to_int32(d: f64) -> i32 {
    if !d.is_finite() {
        return 0;
    }
    let wrapped = d.trunc().rem_euclid(TWO_32);
    let signed = if wrapped >= TWO_31 {
        wrapped - TWO_32
    } else {
        wrapped
    };
    signed as i32
}

/// ECMAScript `ToNumber` on string contents.
fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return parse_hex(digits);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if is_decimal_literal(trimmed) => trimmed.parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn parse_hex(digits: &str) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0, |acc: f64, c| {
            c.to_digit(16).map(|digit| acc * 16.0 + f64::from(digit))
        })
        .unwrap_or(f64::NAN)
}

/// Signed decimal digits with an optional fraction and exponent.
///
/// At least one mantissa digit is required, on either side of the point.
fn is_decimal_literal(text: &str) -> bool {
    let signs = &['+', '-'][..];
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    let unsigned = text.strip_prefix(signs).unwrap_or(text);
    let (mantissa, exponent) = match unsigned.find(&['e', 'E'][..]) {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return false;
    }
    if !all_digits(whole) || !all_digits(fraction) {
        return false;
    }
    match exponent {
        None => true,
        Some(exponent) => {
            let digits = exponent.strip_prefix(signs).unwrap_or(exponent);
            !digits.is_empty() && all_digits(digits)
        }
    }
}

fn number_to_string(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_owned()
    } else if d.is_infinite() {
        let text = if d > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_owned()
    } else {
        // Rust prints integral floats without a fraction, as ActionScript does
        format!("{d}")
    }
}

fn is_primitive(tag: ObjectTag) -> bool {
    matches!(
        tag,
        ObjectTag::Boolean | ObjectTag::Integer | ObjectTag::Number | ObjectTag::Str
    )
}

impl ObjectHeap {
    /// String form of `obj`.
    ///
    /// Unless `debug` is set, a script `toString` declared on the object is
    /// called and must return a string.
    pub fn to_string(&mut self, obj: ObjectId, debug: bool) -> ObjectResult<String> {
        avm_stack::ensure_sufficient_stack(|| {
            let to_string = self.interner().well_known().to_string;
            if !debug && self.has_property_qname(obj, to_string, &Namespace::PUBLIC)? {
                if let Some(result) = self.call_overload(obj, to_string)? {
                    let text = match self.kind(result)? {
                        ObjectKind::Str(text) => Ok(text.clone()),
                        other => Err(self.raise(ObjectError::unexpected_result(
                            ObjectTag::Str.name(),
                            other.tag().name(),
                        ))),
                    };
                    self.dec_ref(result)?;
                    return text;
                }
            }
            self.plain_string(obj)
        })
    }

    fn plain_string(&self, obj: ObjectId) -> ObjectResult<String> {
        let text = match self.kind(obj)? {
            ObjectKind::Object => "[object Object]".to_owned(),
            ObjectKind::Undefined => "undefined".to_owned(),
            ObjectKind::Null => "null".to_owned(),
            ObjectKind::Boolean(b) => b.to_string(),
            ObjectKind::Integer(i) => i.to_string(),
            ObjectKind::Number(d) => number_to_string(*d),
            ObjectKind::Str(text) => text.clone(),
            ObjectKind::Function(function) => {
                format!("function {}() {{}}", self.interner().lookup(function.name))
            }
            ObjectKind::Class(info) => format!("[class {}]", self.interner().lookup(info.name)),
        };
        Ok(text)
    }

    /// ECMAScript `ToInt32`; objects without a primitive form are rejected.
    pub fn to_int(&self, obj: ObjectId) -> ObjectResult<i32> {
        match self.kind(obj)? {
            ObjectKind::Integer(i) => Ok(*i),
            ObjectKind::Boolean(b) => Ok(i32::from(*b)),
            ObjectKind::Undefined | ObjectKind::Null => Ok(0),
            ObjectKind::Number(d) => Ok(to_int32(*d)),
            ObjectKind::Str(text) => Ok(to_int32(parse_number(text))),
            other => Err(self.raise(ObjectError::conversion_failed(other.tag().name(), "int"))),
        }
    }

    /// ECMAScript `ToUint32`.
    #[expect(clippy::cast_sign_loss, reason = "ToUint32 reinterprets the ToInt32 bits")]
    pub fn to_uint(&self, obj: ObjectId) -> ObjectResult<u32> {
        self.to_int(obj).map(|i| i as u32)
    }

    /// ECMAScript `ToNumber`; objects without a primitive form are rejected.
    pub fn to_number(&self, obj: ObjectId) -> ObjectResult<f64> {
        match self.kind(obj)? {
            ObjectKind::Integer(i) => Ok(f64::from(*i)),
            ObjectKind::Number(d) => Ok(*d),
            ObjectKind::Boolean(b) => Ok(f64::from(u8::from(*b))),
            ObjectKind::Undefined => Ok(f64::NAN),
            ObjectKind::Null => Ok(0.0),
            ObjectKind::Str(text) => Ok(parse_number(text)),
            other => Err(self.raise(ObjectError::conversion_failed(other.tag().name(), "Number"))),
        }
    }

    /// Call the public member `name` of `obj` with no arguments.
    ///
    /// `None` when the member does not resolve to a function. The result is owned.
    fn call_overload(&mut self, obj: ObjectId, name: Name) -> ObjectResult<Option<ObjectId>> {
        let Some(member) = self.get_property_qname(obj, name, &Namespace::PUBLIC)? else {
            return Ok(None);
        };
        if self.tag(member.value)? != ObjectTag::Function {
            return Ok(None);
        }
        self.call_function(member.value, obj, &[], member.level)?
            .map(Some)
            .ok_or_else(|| self.raise(ObjectError::unexpected_result("object", "nothing")))
    }

    /// Results of `valueOf` on both operands, owned by the caller.
    ///
    /// `None` when `left` has no `valueOf`. A primitive or nullish `right`
    /// stands for its own `valueOf` result.
    fn value_of_pair(
        &mut self,
        left: ObjectId,
        right: ObjectId,
    ) -> ObjectResult<Option<(ObjectId, ObjectId)>> {
        let value_of = self.interner().well_known().value_of;
        if !self.has_property_qname(left, value_of, &Namespace::PUBLIC)? {
            return Ok(None);
        }
        let right_tag = self.tag(right)?;
        let right_primitive = is_primitive(right_tag) || right_tag.is_nullish();
        if !right_primitive && !self.has_property_qname(right, value_of, &Namespace::PUBLIC)? {
            return Err(self.raise(ObjectError::missing_value_of()));
        }
        let first = self
            .call_overload(left, value_of)?
            .ok_or_else(|| self.raise(ObjectError::not_callable(ObjectTag::Object.name())))?;
        let second = if right_primitive {
            self.inc_ref(right).map(|()| Some(right))
        } else {
            self.call_overload(right, value_of)
        };
        let second = match second {
            Ok(Some(second)) => second,
            Ok(None) => {
                self.dec_ref(first)?;
                return Err(self.raise(ObjectError::not_callable(ObjectTag::Object.name())));
            }
            Err(err) => {
                self.dec_ref(first)?;
                return Err(err);
            }
        };
        Ok(Some((first, second)))
    }

    /// Script `==`.
    ///
    /// Identity is always equal. `null` and `undefined` equal each other and
    /// nothing else. When either operand is an object, the object's `equals`
    /// decides, then `valueOf` on both sides. Objects without either are
    /// unequal to everything but themselves.
    pub fn is_equal(&mut self, left: ObjectId, right: ObjectId) -> ObjectResult<bool> {
        if left == right {
            return Ok(true);
        }
        avm_stack::ensure_sufficient_stack(|| {
            let (left_tag, right_tag) = (self.tag(left)?, self.tag(right)?);
            if left_tag.is_nullish() || right_tag.is_nullish() {
                return Ok(left_tag.is_nullish() && right_tag.is_nullish());
            }
            if is_primitive(left_tag) && is_primitive(right_tag) {
                return self.primitive_equal(left, right);
            }
            // The object operand decides
            let (left, right) = if is_primitive(left_tag) {
                (right, left)
            } else {
                (left, right)
            };

            let equals = self.interner().well_known().equals;
            if self.has_property_qname(left, equals, &Namespace::PUBLIC)? {
                return self.call_equals(left, right, equals);
            }
            match self.value_of_pair(left, right)? {
                Some((first, second)) => {
                    let result = self.is_equal(first, second);
                    self.dec_ref(first)?;
                    self.dec_ref(second)?;
                    result
                }
                None => {
                    tracing::trace!(
                        left = left_tag.name(),
                        right = right_tag.name(),
                        "no equality overload"
                    );
                    Ok(false)
                }
            }
        })
    }

    fn call_equals(&mut self, left: ObjectId, right: ObjectId, equals: Name) -> ObjectResult<bool> {
        let member = self
            .get_property_qname(left, equals, &Namespace::PUBLIC)?
            .ok_or_else(|| self.raise(ObjectError::variable_not_found()))?;
        let result = self
            .call_function(member.value, left, &[right], member.level)?
            .ok_or_else(|| {
                self.raise(ObjectError::unexpected_result(
                    ObjectTag::Boolean.name(),
                    "nothing",
                ))
            })?;
        let outcome = match self.kind(result)? {
            ObjectKind::Boolean(b) => Ok(*b),
            other => Err(self.raise(ObjectError::unexpected_result(
                ObjectTag::Boolean.name(),
                other.tag().name(),
            ))),
        };
        self.dec_ref(result)?;
        outcome
    }

    fn primitive_equal(&self, left: ObjectId, right: ObjectId) -> ObjectResult<bool> {
        match (self.kind(left)?, self.kind(right)?) {
            (ObjectKind::Str(a), ObjectKind::Str(b)) => Ok(a == b),
            (ObjectKind::Integer(a), ObjectKind::Integer(b)) => Ok(a == b),
            _ => {
                #[expect(clippy::float_cmp, reason = "script equality is exact")]
                let equal = self.to_number(left)? == self.to_number(right)?;
                Ok(equal)
            }
        }
    }

    /// Script `<`.
    ///
    /// Objects are ordered through `valueOf`, on whichever side they appear.
    /// An object without one cannot be ordered.
    pub fn is_less(&mut self, left: ObjectId, right: ObjectId) -> ObjectResult<bool> {
        avm_stack::ensure_sufficient_stack(|| {
            let (left_tag, right_tag) = (self.tag(left)?, self.tag(right)?);
            let orderable = |tag: ObjectTag| is_primitive(tag) || tag.is_nullish();
            if orderable(left_tag) && orderable(right_tag) {
                if let (ObjectKind::Str(a), ObjectKind::Str(b)) =
                    (self.kind(left)?, self.kind(right)?)
                {
                    return Ok(a < b);
                }
                return Ok(self.to_number(left)? < self.to_number(right)?);
            }

            let pair = if orderable(left_tag) {
                self.value_of_pair(right, left)?
                    .map(|(second, first)| (first, second))
            } else {
                self.value_of_pair(left, right)?
            };
            if let Some((first, second)) = pair {
                tracing::trace!("overloaded less-than");
                let result = self.is_less(first, second);
                self.dec_ref(first)?;
                self.dec_ref(second)?;
                return result;
            }
            Err(self.raise(ObjectError::unordered_comparison(
                left_tag.name(),
                right_tag.name(),
            )))
        })
    }
}

#[cfg(test)]
mod tests;
