//! Member slots: the storage cell of one declared property.

use smallvec::SmallVec;

use crate::{ObjectError, ObjectId, ObjectResult};

/// Storage for one `(name, level, namespace)` declaration.
///
/// A slot either stores a value directly or routes reads and writes through
/// accessor functions, never both. Every `ObjectId` held here is an owned
/// reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberSlot {
    /// Plain storage. `None` is a declared but unassigned member.
    Direct(Option<ObjectId>),
    /// Getter and/or setter functions.
    Accessor {
        getter: Option<ObjectId>,
        setter: Option<ObjectId>,
    },
}

/// What a read of this slot resolves to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Readable {
    Value(ObjectId),
    Getter(ObjectId),
}

/// Outcome of declaring an accessor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Declared {
    /// The function is now installed and owned by the slot.
    Installed,
    /// The same function was already installed; the caller keeps its reference.
    AlreadyPresent,
}

impl MemberSlot {
    pub const EMPTY: MemberSlot = MemberSlot::Direct(None);

    #[inline]
    pub fn value(&self) -> Option<ObjectId> {
        match self {
            MemberSlot::Direct(value) => *value,
            MemberSlot::Accessor { .. } => None,
        }
    }

    #[inline]
    pub fn getter(&self) -> Option<ObjectId> {
        match self {
            MemberSlot::Accessor { getter, .. } => *getter,
            MemberSlot::Direct(_) => None,
        }
    }

    #[inline]
    pub fn setter(&self) -> Option<ObjectId> {
        match self {
            MemberSlot::Accessor { setter, .. } => *setter,
            MemberSlot::Direct(_) => None,
        }
    }

    #[inline]
    pub fn is_accessor(&self) -> bool {
        matches!(self, MemberSlot::Accessor { .. })
    }

    /// Getter first, then a stored value. A setter-only slot is not readable.
    pub fn readable(&self) -> Option<Readable> {
        match self {
            MemberSlot::Direct(value) => value.map(Readable::Value),
            MemberSlot::Accessor { getter, .. } => getter.map(Readable::Getter),
        }
    }

    /// Store `value`, returning the previous value for the caller to release.
    pub fn replace_value(&mut self, value: ObjectId) -> ObjectResult<Option<ObjectId>> {
        match self {
            MemberSlot::Direct(slot) => Ok(slot.replace(value)),
            MemberSlot::Accessor { .. } => Err(ObjectError::accessor_conflict()),
        }
    }

    pub fn declare_getter(&mut self, function: ObjectId) -> ObjectResult<Declared> {
        match self {
            MemberSlot::Direct(None) => {
                *self = MemberSlot::Accessor {
                    getter: Some(function),
                    setter: None,
                };
                Ok(Declared::Installed)
            }
            MemberSlot::Direct(Some(_)) => Err(ObjectError::accessor_conflict()),
            MemberSlot::Accessor { getter, .. } => install(getter, function),
        }
    }

    pub fn declare_setter(&mut self, function: ObjectId) -> ObjectResult<Declared> {
        match self {
            MemberSlot::Direct(None) => {
                *self = MemberSlot::Accessor {
                    getter: None,
                    setter: Some(function),
                };
                Ok(Declared::Installed)
            }
            MemberSlot::Direct(Some(_)) => Err(ObjectError::accessor_conflict()),
            MemberSlot::Accessor { setter, .. } => install(setter, function),
        }
    }

    /// Every owned reference, for release on teardown.
    pub fn into_owned(self) -> SmallVec<[ObjectId; 2]> {
        match self {
            MemberSlot::Direct(value) => value.into_iter().collect(),
            MemberSlot::Accessor { getter, setter } => getter.into_iter().chain(setter).collect(),
        }
    }
}

impl Default for MemberSlot {
    fn default() -> Self {
        Self::EMPTY
    }
}

// Redeclaration happens when an interface is implemented more than once.
fn install(place: &mut Option<ObjectId>, function: ObjectId) -> ObjectResult<Declared> {
    match place {
        None => {
            *place = Some(function);
            Ok(Declared::Installed)
        }
        Some(existing) if *existing == function => Ok(Declared::AlreadyPresent),
        Some(_) => Err(ObjectError::duplicate_declaration("accessor")),
    }
}
