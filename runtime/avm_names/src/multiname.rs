//! Multinames: a local name paired with its namespace candidates.

use std::fmt;

use smallvec::SmallVec;

use crate::{InternError, MemberKey, Name, Namespace, StringInterner, StringLookup};

/// The local part of a multiname.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LocalName {
    Str(Name),
    Int(i32),
    Number(f64),
}

/// A member name with an ordered set of namespace candidates.
///
/// Candidates are kept sorted and deduplicated by namespace name, so
/// membership is a binary search. A multiname always has at least one
/// candidate: an empty candidate list becomes the public namespace.
#[derive(Clone, Debug, PartialEq)]
pub struct Multiname {
    local: LocalName,
    namespaces: SmallVec<[Namespace; 2]>,
}

/// Why a multiname has no `ns::name` rendering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QualifiedStringError {
    /// More than one namespace candidate.
    AmbiguousNamespace { candidates: usize },
    /// The local name is numeric.
    NonStringLocal,
}

impl fmt::Display for QualifiedStringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousNamespace { candidates } => {
                write!(f, "qualified name needs one namespace, found {candidates}")
            }
            Self::NonStringLocal => write!(f, "qualified name needs a string local name"),
        }
    }
}

impl std::error::Error for QualifiedStringError {}

impl Multiname {
    pub fn new(local: LocalName, namespaces: impl IntoIterator<Item = Namespace>) -> Self {
        let mut namespaces: SmallVec<[Namespace; 2]> = namespaces.into_iter().collect();
        namespaces.sort();
        namespaces.dedup();
        if namespaces.is_empty() {
            namespaces.push(Namespace::PUBLIC);
        }
        Multiname { local, namespaces }
    }

    /// A name resolved to exactly one namespace.
    pub fn qname(name: Name, ns: Namespace) -> Self {
        Multiname::new(LocalName::Str(name), [ns])
    }

    /// A name in the public namespace.
    pub fn public(name: Name) -> Self {
        Multiname::qname(name, Namespace::PUBLIC)
    }

    /// An integer-indexed name in the public namespace (`a[3]`).
    pub fn index(i: i32) -> Self {
        Multiname::new(LocalName::Int(i), [Namespace::PUBLIC])
    }

    #[inline]
    pub fn local(&self) -> LocalName {
        self.local
    }

    /// Sorted namespace candidates (never empty).
    #[inline]
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Whether `ns` is one of the candidates.
    #[inline]
    pub fn has_namespace(&self, ns: &Namespace) -> bool {
        self.namespaces.binary_search(ns).is_ok()
    }

    /// More than one candidate namespace.
    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        self.namespaces.len() > 1
    }

    /// Whether the local name is the string `name`.
    #[inline]
    pub fn is_named(&self, name: Name) -> bool {
        self.local == LocalName::Str(name)
    }

    /// The key of this member in a variable table.
    ///
    /// Integral local names key numerically and never touch the interner.
    /// Other numbers are interned in their canonical string form, which is
    /// the only way this fails.
    pub fn key(&self, interner: &StringInterner) -> Result<MemberKey, InternError> {
        match self.local {
            LocalName::Str(name) => Ok(MemberKey::of_name(name, interner)),
            LocalName::Int(i) => Ok(MemberKey::Index(i64::from(i))),
            LocalName::Number(d) => match integral(d).and_then(MemberKey::of_index) {
                Some(key) => Ok(key),
                None => interner.try_intern(&number_key(d)).map(MemberKey::Name),
            },
        }
    }

    /// `ns::name`, for single-namespace string names.
    pub fn qualified_string<L: StringLookup>(
        &self,
        lookup: &L,
    ) -> Result<String, QualifiedStringError> {
        if self.namespaces.len() != 1 {
            return Err(QualifiedStringError::AmbiguousNamespace {
                candidates: self.namespaces.len(),
            });
        }
        let LocalName::Str(name) = self.local else {
            return Err(QualifiedStringError::NonStringLocal);
        };
        Ok(format!(
            "{}::{}",
            lookup.lookup(self.namespaces[0].name()),
            lookup.lookup(name)
        ))
    }

    /// Printable form: every candidate as `[prefix ns]`, then the local name.
    pub fn display<'a, L: StringLookup>(&'a self, lookup: &'a L) -> MultinameDisplay<'a, L> {
        MultinameDisplay {
            multiname: self,
            lookup,
        }
    }
}

/// `d` as an integer, when it is integral and exactly representable.
fn integral(d: f64) -> Option<i64> {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "integral and below 2^53, so the conversion is exact"
    )]
    let whole = (d.is_finite() && d.fract() == 0.0 && d.abs() < 1e15).then(|| d as i64);
    whole
}

/// Canonical string form of a numeric member name.
fn number_key(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_owned()
    } else if d.is_infinite() {
        let text = if d > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_owned()
    } else if let Some(whole) = integral(d) {
        whole.to_string()
    } else {
        d.to_string()
    }
}

/// Display adapter returned by [`Multiname::display`].
pub struct MultinameDisplay<'a, L> {
    multiname: &'a Multiname,
    lookup: &'a L,
}

impl<L: StringLookup> fmt::Display for MultinameDisplay<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ns in self.multiname.namespaces() {
            write!(
                f,
                "[{}{}] ",
                ns.kind().prefix(),
                self.lookup.lookup(ns.name())
            )?;
        }
        match self.multiname.local {
            LocalName::Str(name) => write!(f, "{}", self.lookup.lookup(name)),
            LocalName::Int(i) => write!(f, "{i}"),
            LocalName::Number(d) => write!(f, "{}", number_key(d)),
        }
    }
}

#[cfg(test)]
mod tests;
