//! Namespace candidates.
//!
//! A namespace is identified by its name alone. The kind is carried for
//! diagnostics and never participates in equality or ordering.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::Name;

/// ABC namespace kind, with the constant pool codes it is decoded from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum NamespaceKind {
    /// `CONSTANT_Namespace` (0x08), also the public namespace.
    #[default]
    Namespace,
    /// `CONSTANT_PackageNamespace` (0x16).
    Package,
    /// `CONSTANT_PackageInternalNs` (0x17).
    PackageInternal,
    /// `CONSTANT_ProtectedNamespace` (0x18).
    Protected,
    /// `CONSTANT_ExplicitNamespace` (0x19).
    Explicit,
    /// `CONSTANT_StaticProtectedNs` (0x1A).
    StaticProtected,
    /// `CONSTANT_PrivateNs` (0x05).
    Private,
}

impl NamespaceKind {
    /// Decode a constant pool kind byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x08 => Some(Self::Namespace),
            0x16 => Some(Self::Package),
            0x17 => Some(Self::PackageInternal),
            0x18 => Some(Self::Protected),
            0x19 => Some(Self::Explicit),
            0x1a => Some(Self::StaticProtected),
            0x05 => Some(Self::Private),
            _ => None,
        }
    }

    /// The constant pool kind byte.
    pub fn code(self) -> u8 {
        match self {
            Self::Namespace => 0x08,
            Self::Package => 0x16,
            Self::PackageInternal => 0x17,
            Self::Protected => 0x18,
            Self::Explicit => 0x19,
            Self::StaticProtected => 0x1a,
            Self::Private => 0x05,
        }
    }

    /// Prefix used when a multiname is printed.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Namespace => "ns:",
            Self::Package => "pakns:",
            Self::PackageInternal => "pakintns:",
            Self::Protected => "protns:",
            Self::Explicit => "explns:",
            Self::StaticProtected => "staticprotns:",
            Self::Private => "privns:",
        }
    }
}

/// A namespace candidate: a name plus an informational kind.
#[derive(Copy, Clone, Debug, Default)]
pub struct Namespace {
    name: Name,
    kind: NamespaceKind,
}

impl Namespace {
    /// The public namespace (empty name).
    pub const PUBLIC: Namespace = Namespace {
        name: Name::EMPTY,
        kind: NamespaceKind::Namespace,
    };

    pub fn new(name: Name, kind: NamespaceKind) -> Self {
        Namespace { name, kind }
    }

    /// A namespace of the plain `Namespace` kind.
    pub fn named(name: Name) -> Self {
        Namespace::new(name, NamespaceKind::Namespace)
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> NamespaceKind {
        self.kind
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.name.is_empty()
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Namespace {}

impl PartialOrd for Namespace {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Namespace {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Hash for Namespace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
