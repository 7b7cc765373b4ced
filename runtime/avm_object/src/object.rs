//! Scripted objects and their handles.

use std::fmt;

use avm_names::Name;
use bitflags::bitflags;

use crate::{FunctionObject, ManagerId, RefCount, VariableTable};

/// Handle to an object in an [`ObjectHeap`](crate::ObjectHeap).
///
/// The generation distinguishes successive occupants of one arena slot, so a
/// handle to a destroyed object never aliases its replacement.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    #[inline]
    pub(crate) const fn from_parts(index: u32, generation: u32) -> Self {
        ObjectId { index, generation }
    }

    /// Arena position.
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}v{})", self.index, self.generation)
    }
}

bitflags! {
    /// Lifecycle flags of a scripted object.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct ObjectFlags: u8 {
        /// Class setup finished; no further accessor declarations.
        const INITIALIZED = 1 << 0;
        /// Retired into a pool and not observable.
        const POOLED = 1 << 1;
    }
}

/// Field-less discriminant of [`ObjectKind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectTag {
    Object,
    Undefined,
    Null,
    Boolean,
    Integer,
    Number,
    Str,
    Function,
    Class,
}

impl ObjectTag {
    pub fn name(self) -> &'static str {
        match self {
            ObjectTag::Object => "Object",
            ObjectTag::Undefined => "undefined",
            ObjectTag::Null => "null",
            ObjectTag::Boolean => "Boolean",
            ObjectTag::Integer => "int",
            ObjectTag::Number => "Number",
            ObjectTag::Str => "String",
            ObjectTag::Function => "Function",
            ObjectTag::Class => "Class",
        }
    }

    /// `null` or `undefined`.
    #[inline]
    pub fn is_nullish(self) -> bool {
        matches!(self, ObjectTag::Null | ObjectTag::Undefined)
    }
}

/// Ancestry record of a class object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: Name,
    /// Level of instances created from this class: 0 for a root class.
    pub max_level: u32,
    /// Owned reference to the superclass.
    pub super_class: Option<ObjectId>,
}

/// Concrete type and primitive payload of an object.
#[derive(Clone, Debug)]
pub enum ObjectKind {
    Object,
    Undefined,
    Null,
    Boolean(bool),
    Integer(i32),
    Number(f64),
    Str(String),
    Function(FunctionObject),
    Class(ClassInfo),
}

impl ObjectKind {
    pub fn tag(&self) -> ObjectTag {
        match self {
            ObjectKind::Object => ObjectTag::Object,
            ObjectKind::Undefined => ObjectTag::Undefined,
            ObjectKind::Null => ObjectTag::Null,
            ObjectKind::Boolean(_) => ObjectTag::Boolean,
            ObjectKind::Integer(_) => ObjectTag::Integer,
            ObjectKind::Number(_) => ObjectTag::Number,
            ObjectKind::Str(_) => ObjectTag::Str,
            ObjectKind::Function(_) => ObjectTag::Function,
            ObjectKind::Class(_) => ObjectTag::Class,
        }
    }

    /// References held by the payload itself, outside the variable table.
    pub(crate) fn owned_references(&self) -> impl Iterator<Item = ObjectId> {
        let held = match self {
            ObjectKind::Function(function) => function.overridden_by(),
            ObjectKind::Class(info) => info.super_class,
            _ => None,
        };
        held.into_iter()
    }
}

/// A reference-counted object with its member table.
#[derive(Debug)]
pub struct ScriptObject {
    pub(crate) kind: ObjectKind,
    pub(crate) variables: VariableTable,
    pub(crate) ref_count: RefCount,
    pub(crate) cur_level: u32,
    /// Owned reference to the class this object was built from.
    pub(crate) prototype: Option<ObjectId>,
    pub(crate) manager: Option<ManagerId>,
    pub(crate) flags: ObjectFlags,
}

impl ScriptObject {
    pub(crate) fn new(kind: ObjectKind) -> Self {
        ScriptObject {
            kind,
            variables: VariableTable::new(),
            ref_count: RefCount::new(),
            cur_level: 0,
            prototype: None,
            manager: None,
            flags: ObjectFlags::empty(),
        }
    }

    #[inline]
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    #[inline]
    pub fn tag(&self) -> ObjectTag {
        self.kind.tag()
    }

    #[inline]
    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.ref_count.get()
    }

    #[inline]
    pub fn cur_level(&self) -> u32 {
        self.cur_level
    }

    #[inline]
    pub fn prototype(&self) -> Option<ObjectId> {
        self.prototype
    }

    #[inline]
    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    pub(crate) fn as_function(&self) -> Option<&FunctionObject> {
        match &self.kind {
            ObjectKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub(crate) fn as_class(&self) -> Option<&ClassInfo> {
        match &self.kind {
            ObjectKind::Class(info) => Some(info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
