//! Per-type object pools.
//!
//! A [`Manager`] intercepts the release of objects of one concrete type and
//! keeps up to `capacity` of them for reuse. Pools are owned by the heap and
//! driven from the script thread only.

use crate::{ObjectError, ObjectId, ObjectKind, ObjectResult, ObjectTag};

/// Handle to a pool registered with a heap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ManagerId(pub(crate) u32);

impl ManagerId {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// What happened to an object whose count reached zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Release {
    /// Kept for reuse; the heap must not free it.
    Retained,
    /// Not kept; the heap frees it.
    Discard,
}

/// Decides the fate of a released object.
pub trait OnRelease {
    fn on_release(&mut self, id: ObjectId, tag: ObjectTag) -> ObjectResult<Release>;
}

/// Bounded free list of retired objects of a single type.
#[derive(Clone, Debug)]
pub struct Manager {
    tag: ObjectTag,
    capacity: usize,
    available: Vec<ObjectId>,
}

impl Manager {
    pub fn new(tag: ObjectTag, capacity: usize) -> Self {
        Manager {
            tag,
            capacity,
            available: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn tag(&self) -> ObjectTag {
        self.tag
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retired objects waiting for reuse.
    #[inline]
    pub fn len(&self) -> usize {
        self.available.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    /// Most recently retired object, if any.
    pub(crate) fn take(&mut self) -> Option<ObjectId> {
        self.available.pop()
    }
}

impl OnRelease for Manager {
    fn on_release(&mut self, id: ObjectId, tag: ObjectTag) -> ObjectResult<Release> {
        if tag != self.tag {
            return Err(ObjectError::pool_type_mismatch(self.tag.name(), tag.name()));
        }
        if self.available.len() >= self.capacity {
            return Ok(Release::Discard);
        }
        self.available.push(id);
        Ok(Release::Retained)
    }
}

/// Primitive payloads that a pool can recycle.
pub trait Poolable {
    const TAG: ObjectTag;

    fn into_kind(self) -> ObjectKind;
}

impl Poolable for i32 {
    const TAG: ObjectTag = ObjectTag::Integer;

    fn into_kind(self) -> ObjectKind {
        ObjectKind::Integer(self)
    }
}

impl Poolable for f64 {
    const TAG: ObjectTag = ObjectTag::Number;

    fn into_kind(self) -> ObjectKind {
        ObjectKind::Number(self)
    }
}

impl Poolable for bool {
    const TAG: ObjectTag = ObjectTag::Boolean;

    fn into_kind(self) -> ObjectKind {
        ObjectKind::Boolean(self)
    }
}

#[cfg(test)]
mod tests;
