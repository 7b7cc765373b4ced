//! Error types for the object model.
//!
//! # Severity
//!
//! Two classes of failure leave this crate:
//!
//! - **Invariant violations** ([`ObjectError::is_fatal`]): the object graph or
//!   a variable table is corrupt, or a caller broke a structural contract.
//!   Execution must stop; the interpreter never turns these into script
//!   exceptions.
//! - **Runtime errors**: conditions reachable from well-formed script code.
//!   The interpreter converts them into script-visible exceptions.
//!
//! A missing property is neither: lookups report it as `Ok(None)`.

use std::fmt;

use avm_names::InternError;

use crate::ObjectId;

/// Result of an object-model operation.
pub type ObjectResult<T> = Result<T, ObjectError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ObjectErrorKind {
    // Invariant violations
    #[error("object #{index} used after release")]
    DanglingObject { index: u32 },
    #[error("reference count underflow on object #{index}")]
    RefCountUnderflow { index: u32 },
    #[error("duplicate declaration of {name}")]
    DuplicateDeclaration { name: String },
    #[error("slot {index} out of bounds (table has {len} slots)")]
    SlotOutOfBounds { index: u32, len: usize },
    #[error("slot {index} is not initialized")]
    SlotUninitialized { index: u32 },
    #[error("slot {index} has accessors")]
    SlotHasAccessor { index: u32 },
    #[error("setter returned a value")]
    SetterReturnedValue,
    #[error("member holds both a value and accessors")]
    AccessorConflict,
    #[error("pool holds {expected} objects, got {got}")]
    PoolTypeMismatch {
        expected: &'static str,
        got: &'static str,
    },
    #[error("variable table position {position} is vacant")]
    CorruptTable { position: u32 },
    #[error("members declared after initialization")]
    AlreadyInitialized,
    #[error("level {level} outside 0..={max_level}")]
    LevelOutOfRange { level: u32, max_level: u32 },
    #[error("unknown object pool #{index}")]
    UnknownPool { index: u32 },
    #[error("member name table exhausted: {message}")]
    NamesExhausted { message: String },

    // Runtime errors
    #[error("variable not found")]
    VariableNotFound,
    #[error("ambiguous deletion: declared at {count} levels")]
    AmbiguousDeletion { count: usize },
    #[error("missing valueOf for second operand")]
    MissingValueOf,
    #[error("comparison between {left} and {right} is not defined")]
    UnorderedComparison {
        left: &'static str,
        right: &'static str,
    },
    #[error("cannot convert {type_name} to {target}")]
    ConversionFailed {
        type_name: &'static str,
        target: &'static str,
    },
    #[error("{type_name} is not callable")]
    NotCallable { type_name: &'static str },
    #[error("expected {expected} result, got {got}")]
    UnexpectedResult {
        expected: &'static str,
        got: &'static str,
    },
    #[error("getters are not supported in string lookup")]
    GetterInStringLookup,
    #[error("index {index} out of bounds")]
    IndexOutOfBounds { index: usize },
    #[error("property is read-only")]
    ReadOnlyProperty,
}

impl ObjectErrorKind {
    /// Whether this kind signals model corruption.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DanglingObject { .. }
                | Self::RefCountUnderflow { .. }
                | Self::DuplicateDeclaration { .. }
                | Self::SlotOutOfBounds { .. }
                | Self::SlotUninitialized { .. }
                | Self::SlotHasAccessor { .. }
                | Self::SetterReturnedValue
                | Self::AccessorConflict
                | Self::PoolTypeMismatch { .. }
                | Self::CorruptTable { .. }
                | Self::AlreadyInitialized
                | Self::LevelOutOfRange { .. }
                | Self::UnknownPool { .. }
                | Self::NamesExhausted { .. }
        )
    }
}

/// Object-model error.
///
/// Carries the offending qualified name and the diagnostic origin (the
/// movie URL) when the raising site knows them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectError {
    pub kind: ObjectErrorKind,
    /// Printed form of the multiname involved, if any.
    pub name: Option<String>,
    /// Origin of the running script, attached by the heap.
    pub origin: Option<String>,
}

impl ObjectError {
    fn from_kind(kind: ObjectErrorKind) -> Self {
        Self {
            kind,
            name: None,
            origin: None,
        }
    }

    /// Attach the offending member name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach the script origin, unless one is already present.
    #[must_use]
    pub fn with_origin(mut self, origin: Option<&str>) -> Self {
        if self.origin.is_none() {
            self.origin = origin.map(str::to_owned);
        }
        self
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    // Invariant violations

    pub fn dangling(id: ObjectId) -> Self {
        Self::from_kind(ObjectErrorKind::DanglingObject { index: id.index() })
    }

    pub fn ref_count_underflow(id: ObjectId) -> Self {
        Self::from_kind(ObjectErrorKind::RefCountUnderflow { index: id.index() })
    }

    pub fn duplicate_declaration(what: impl Into<String>) -> Self {
        Self::from_kind(ObjectErrorKind::DuplicateDeclaration { name: what.into() })
    }

    pub fn slot_out_of_bounds(index: u32, len: usize) -> Self {
        Self::from_kind(ObjectErrorKind::SlotOutOfBounds { index, len })
    }

    pub fn slot_uninitialized(index: u32) -> Self {
        Self::from_kind(ObjectErrorKind::SlotUninitialized { index })
    }

    pub fn slot_has_accessor(index: u32) -> Self {
        Self::from_kind(ObjectErrorKind::SlotHasAccessor { index })
    }

    pub fn setter_returned_value() -> Self {
        Self::from_kind(ObjectErrorKind::SetterReturnedValue)
    }

    pub fn accessor_conflict() -> Self {
        Self::from_kind(ObjectErrorKind::AccessorConflict)
    }

    pub fn pool_type_mismatch(expected: &'static str, got: &'static str) -> Self {
        Self::from_kind(ObjectErrorKind::PoolTypeMismatch { expected, got })
    }

    pub fn corrupt_table(position: u32) -> Self {
        Self::from_kind(ObjectErrorKind::CorruptTable { position })
    }

    pub fn already_initialized() -> Self {
        Self::from_kind(ObjectErrorKind::AlreadyInitialized)
    }

    pub fn level_out_of_range(level: u32, max_level: u32) -> Self {
        Self::from_kind(ObjectErrorKind::LevelOutOfRange { level, max_level })
    }

    pub fn unknown_pool(index: u32) -> Self {
        Self::from_kind(ObjectErrorKind::UnknownPool { index })
    }

    pub fn names_exhausted(err: &InternError) -> Self {
        Self::from_kind(ObjectErrorKind::NamesExhausted {
            message: err.to_string(),
        })
    }

    // Runtime errors

    pub fn variable_not_found() -> Self {
        Self::from_kind(ObjectErrorKind::VariableNotFound)
    }

    pub fn ambiguous_deletion(count: usize) -> Self {
        Self::from_kind(ObjectErrorKind::AmbiguousDeletion { count })
    }

    pub fn missing_value_of() -> Self {
        Self::from_kind(ObjectErrorKind::MissingValueOf)
    }

    pub fn unordered_comparison(left: &'static str, right: &'static str) -> Self {
        Self::from_kind(ObjectErrorKind::UnorderedComparison { left, right })
    }

    pub fn conversion_failed(type_name: &'static str, target: &'static str) -> Self {
        Self::from_kind(ObjectErrorKind::ConversionFailed { type_name, target })
    }

    pub fn not_callable(type_name: &'static str) -> Self {
        Self::from_kind(ObjectErrorKind::NotCallable { type_name })
    }

    pub fn unexpected_result(expected: &'static str, got: &'static str) -> Self {
        Self::from_kind(ObjectErrorKind::UnexpectedResult { expected, got })
    }

    pub fn getter_in_string_lookup() -> Self {
        Self::from_kind(ObjectErrorKind::GetterInStringLookup)
    }

    pub fn index_out_of_bounds(index: usize) -> Self {
        Self::from_kind(ObjectErrorKind::IndexOutOfBounds { index })
    }

    pub fn read_only_property() -> Self {
        Self::from_kind(ObjectErrorKind::ReadOnlyProperty)
    }
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        if let Some(origin) = &self.origin {
            write!(f, " in {origin}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ObjectError {}
