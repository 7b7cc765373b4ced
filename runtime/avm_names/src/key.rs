//! Variable table keys.

use std::borrow::Cow;

use crate::{Name, StringLookup};

/// Integral names at or beyond this magnitude key by their text instead.
const INDEX_LIMIT: u64 = 1_000_000_000_000_000;

/// What a variable table files a member under.
///
/// Integral names stay numeric, so indexed access never interns. A string
/// name whose text is a canonical integer keys the same member as that
/// integer, which makes `a[1]` and `a["1"]` agree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberKey {
    Name(Name),
    Index(i64),
}

impl MemberKey {
    /// Key of the interned string `name`.
    pub fn of_name<L: StringLookup + ?Sized>(name: Name, lookup: &L) -> Self {
        match parse_index(lookup.lookup(name)) {
            Some(index) => MemberKey::Index(index),
            None => MemberKey::Name(name),
        }
    }

    /// Key of an integer, or `None` when it has to key by its text.
    pub fn of_index(index: i64) -> Option<Self> {
        (index.unsigned_abs() < INDEX_LIMIT).then_some(MemberKey::Index(index))
    }

    pub fn name(self) -> Option<Name> {
        match self {
            MemberKey::Name(name) => Some(name),
            MemberKey::Index(_) => None,
        }
    }

    /// Text of the key as a script sees it.
    pub fn text<'a, L: StringLookup + ?Sized>(self, lookup: &'a L) -> Cow<'a, str> {
        match self {
            MemberKey::Name(name) => Cow::Borrowed(lookup.lookup(name)),
            MemberKey::Index(index) => Cow::Owned(index.to_string()),
        }
    }
}

/// The integer spelled by `text` in canonical decimal form.
fn parse_index(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let canonical = match digits.as_bytes() {
        [b'0'] => digits.len() == text.len(),
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    };
    if !canonical {
        return None;
    }
    text.parse().ok().filter(|index: &i64| index.unsigned_abs() < INDEX_LIMIT)
}
