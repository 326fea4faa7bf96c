//! Pre-computed type metadata flags.
//!
//! `TypeFlags` are computed when a type enters the pool and kept consistent
//! by the refinement engine, enabling O(1) abstractness queries without
//! traversal. `ParamAttrs` are the per-parameter attribute bits carried by
//! function signatures.

use bitflags::bitflags;

bitflags! {
    /// Pre-computed type properties for O(1) queries.
    ///
    /// The `ABSTRACT` bit is the one mutable property: the refinement
    /// engine re-derives it from a node's containment edges whenever an
    /// edge is repointed. Category bits never change after interning.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeFlags: u16 {
        // === Presence flags (bits 0-7) ===

        /// Shape not final: the type is, or transitively contains, an
        /// unresolved placeholder.
        const ABSTRACT = 1 << 0;
        /// Slot is dead: the node was refined away (a resolved placeholder
        /// or a collapsed duplicate) and forwards to its survivor.
        const FORWARDED = 1 << 1;

        // === Category flags (bits 8-15) ===

        /// Pre-interned primitive kind (void, label, float, double).
        const IS_PRIMITIVE = 1 << 8;
        /// Floating-point primitive.
        const IS_FLOATING = 1 << 9;
        /// First-class value type (integer, float, double, pointer, vector).
        const IS_FIRST_CLASS = 1 << 10;
    }
}

impl TypeFlags {
    /// Flags that propagate from contained types to their container.
    ///
    /// When building a composite type, these flags are inherited from all
    /// contained types via bitwise OR.
    pub const PROPAGATE_MASK: Self = Self::ABSTRACT;

    /// Check if the type's final shape is not yet known.
    #[inline]
    pub const fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    /// Check if the node slot is dead (refined away).
    #[inline]
    pub const fn is_forwarded(self) -> bool {
        self.contains(Self::FORWARDED)
    }

    /// Combine flags inherited from one contained type.
    #[inline]
    pub const fn propagate_from(child: Self) -> Self {
        Self::from_bits_truncate(child.bits() & Self::PROPAGATE_MASK.bits())
    }

    /// Combine propagated flags from multiple contained types.
    #[inline]
    pub fn propagate_all(children: impl IntoIterator<Item = Self>) -> Self {
        let mut result = Self::empty();
        for child in children {
            result = result.union(Self::propagate_from(child));
        }
        result
    }
}

impl Default for TypeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Per-parameter attribute bits for function signatures.
    ///
    /// Attributes are part of a function type's structural key but never
    /// affect containment or abstractness. Slot 0 of an attribute list
    /// refers to the return value; fixed parameters start at slot 1.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ParamAttrs: u16 {
        /// Zero-extended before/after the call.
        const ZEXT = 1;
        /// Sign-extended before/after the call.
        const SEXT = 1 << 1;
        /// The function never returns.
        const NO_RETURN = 1 << 2;
        /// Force the argument into a register.
        const IN_REG = 1 << 3;
        /// Hidden pointer to a struct return value.
        const STRUCT_RET = 1 << 4;
    }
}

impl ParamAttrs {
    /// Render the attribute set as assembly text, e.g. `"zeroext inreg"`.
    ///
    /// Returns an empty string for the empty set.
    pub fn describe(self) -> String {
        let mut out = String::new();
        for (flag, text) in [
            (Self::ZEXT, "zeroext"),
            (Self::SEXT, "signext"),
            (Self::NO_RETURN, "noreturn"),
            (Self::IN_REG, "inreg"),
            (Self::STRUCT_RET, "sret"),
        ] {
            if self.contains(flag) {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(text);
            }
        }
        out
    }
}

impl std::fmt::Display for ParamAttrs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

#[cfg(test)]
mod tests;
