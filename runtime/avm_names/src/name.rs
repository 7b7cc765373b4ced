//! Interned member name.

use std::fmt;

/// Handle to a string held by a [`StringInterner`](crate::StringInterner).
///
/// The top four bits select the interner shard and the rest index into it.
/// Only the interner builds names, so two names compare equal exactly when
/// they spell the same text in the same interner.
///
/// Ordering follows the handle, not the text. Variable tables only need a
/// stable total order over names, which this provides.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string. Also the name of the public namespace.
    pub const EMPTY: Name = Name(0);

    pub(crate) const SHARD_BITS: u32 = 4;
    pub(crate) const NUM_SHARDS: usize = 1 << Self::SHARD_BITS;
    pub(crate) const MAX_LOCAL: u32 = u32::MAX >> Self::SHARD_BITS;

    #[inline]
    pub(crate) const fn new(shard: u32, local: u32) -> Self {
        debug_assert!((shard as usize) < Self::NUM_SHARDS);
        debug_assert!(local <= Self::MAX_LOCAL);
        Name((shard << (32 - Self::SHARD_BITS)) | local)
    }

    #[inline]
    pub(crate) const fn shard(self) -> usize {
        (self.0 >> (32 - Self::SHARD_BITS)) as usize
    }

    #[inline]
    pub(crate) const fn local(self) -> usize {
        (self.0 & Self::MAX_LOCAL) as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({}:{})", self.shard(), self.local())
    }
}
