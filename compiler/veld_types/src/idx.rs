//! Unified type index handle.
//!
//! `Idx` is THE canonical type representation.
//! All types are stored in a unified pool and referenced by their 32-bit index.
//!
//! # Design
//!
//! - 32-bit indices allow 4+ billion distinct types per compilation unit
//! - The primitive kinds and the ubiquitous integer widths are pre-interned
//!   at fixed indices for O(1) access
//! - Type equality is O(1) index comparison; structural keys compare
//!   components by `Idx`, never by recursive comparison

use std::fmt;

/// A 32-bit index into the type pool.
///
/// This is the canonical type handle. Two handles are the same type iff
/// they are the same index; canonicalization guarantees that structurally
/// identical concrete requests return the same index.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Idx(u32);

impl Idx {
    // === Primitive kinds (indices 0-3) ===
    // Owned by collaborators (printer, value layer); pre-interned here so
    // containment edges can target them.

    /// The `void` type (no value).
    pub const VOID: Self = Self(0);
    /// The 32-bit IEEE float type.
    pub const FLOAT: Self = Self(1);
    /// The 64-bit IEEE float type.
    pub const DOUBLE: Self = Self(2);
    /// The `label` type (basic-block markers; not a first-class value).
    pub const LABEL: Self = Self(3);

    // === Pre-interned integer widths (indices 4-8) ===
    // Common widths get fixed indices; other widths are interned on demand.

    /// The 1-bit integer type.
    pub const I1: Self = Self(4);
    /// The 8-bit integer type.
    pub const I8: Self = Self(5);
    /// The 16-bit integer type.
    pub const I16: Self = Self(6);
    /// The 32-bit integer type.
    pub const I32: Self = Self(7);
    /// The 64-bit integer type.
    pub const I64: Self = Self(8);

    // === Reserved range (9-15) ===
    // Reserved for future pre-interned kinds.

    /// First index for dynamically interned types.
    pub const FIRST_DYNAMIC: u32 = 16;

    /// Sentinel value indicating no type / invalid index.
    pub const NONE: Self = Self(u32::MAX);

    /// Create an index from a raw u32 value.
    ///
    /// The caller must ensure the index is valid in the pool.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if this index is in the pre-interned range.
    #[inline]
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }

    /// Check if this is the NONE sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Get the human-readable name for pre-interned types.
    ///
    /// Returns `None` for dynamic types, which need a `Pool` to render.
    #[inline]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("void"),
            1 => Some("float"),
            2 => Some("double"),
            3 => Some("label"),
            4 => Some("i1"),
            5 => Some("i8"),
            6 => Some("i16"),
            7 => Some("i32"),
            8 => Some("i64"),
            _ => None,
        }
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Idx::{}", name.to_uppercase()),
            None if self.is_none() => write!(f, "Idx::NONE"),
            None => write!(f, "Idx({})", self.0),
        }
    }
}

impl fmt::Display for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None if self.is_none() => write!(f, "<none>"),
            None => write!(f, "type#{}", self.0),
        }
    }
}

// Compile-time size assertion: Idx must be exactly 4 bytes
const _: () = assert!(std::mem::size_of::<Idx>() == 4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_interned_indices_are_fixed() {
        assert_eq!(Idx::VOID.raw(), 0);
        assert_eq!(Idx::FLOAT.raw(), 1);
        assert_eq!(Idx::DOUBLE.raw(), 2);
        assert_eq!(Idx::LABEL.raw(), 3);
        assert_eq!(Idx::I1.raw(), 4);
        assert_eq!(Idx::I8.raw(), 5);
        assert_eq!(Idx::I16.raw(), 6);
        assert_eq!(Idx::I32.raw(), 7);
        assert_eq!(Idx::I64.raw(), 8);
    }

    #[test]
    fn reserved_check_works() {
        assert!(Idx::VOID.is_reserved());
        assert!(Idx::I64.is_reserved());
        assert!(!Idx::from_raw(Idx::FIRST_DYNAMIC).is_reserved());
        assert!(!Idx::from_raw(1000).is_reserved());
    }

    #[test]
    fn none_sentinel_works() {
        assert!(Idx::NONE.is_none());
        assert!(!Idx::I32.is_none());
    }

    #[test]
    fn idx_equality_is_identity() {
        assert_eq!(Idx::I32, Idx::I32);
        assert_ne!(Idx::I32, Idx::I64);
        assert_eq!(Idx::from_raw(100), Idx::from_raw(100));
    }

    #[test]
    fn display_names() {
        assert_eq!(Idx::I32.to_string(), "i32");
        assert_eq!(Idx::VOID.to_string(), "void");
        assert_eq!(Idx::from_raw(640).to_string(), "type#640");
    }
}
