//! AVM names - identifiers used to declare and look up object members.
//!
//! - [`Name`]: compact interned member name
//! - [`StringInterner`] / [`SharedInterner`]: sharded, thread-safe interning
//! - [`Namespace`]: a namespace candidate, compared by name only
//! - [`Multiname`]: a local name plus an ordered set of namespace candidates
//! - [`MemberKey`]: what a variable table files a member under
//!
//! Integral names key numerically, and a string spelling a canonical integer
//! keys the same way, so `a[1]` and `a["1"]` address the same member.

mod interner;
mod key;
mod multiname;
mod name;
mod namespace;

pub use interner::{InternError, SharedInterner, StringInterner, StringLookup, WellKnownNames};
pub use key::MemberKey;
pub use multiname::{LocalName, Multiname, MultinameDisplay, QualifiedStringError};
pub use name::Name;
pub use namespace::{Namespace, NamespaceKind};
