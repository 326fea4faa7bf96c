//! Refinement protocol errors.
//!
//! These report caller bugs in graph construction. The pool is left
//! untouched when one is returned, so embedding hosts can recover.

use crate::{Idx, Tag};

/// Error from `refine_abstract_type_to`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum RefineError {
    /// Only placeholder types may undergo identity-changing refinement.
    NotAPlaceholder {
        /// The node the caller tried to refine.
        idx: Idx,
        /// Its actual kind.
        tag: Tag,
    },

    /// The placeholder was already resolved by an earlier refinement.
    AlreadyResolved {
        /// The dead placeholder.
        placeholder: Idx,
    },

    /// A placeholder cannot be refined to itself.
    SelfRefinement {
        /// The placeholder.
        placeholder: Idx,
    },
}

impl std::fmt::Display for RefineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAPlaceholder { idx, tag } => {
                write!(f, "cannot refine {idx}: {tag} is not a placeholder")
            }
            Self::AlreadyResolved { placeholder } => {
                write!(f, "placeholder {placeholder} was already resolved")
            }
            Self::SelfRefinement { placeholder } => {
                write!(f, "cannot refine placeholder {placeholder} to itself")
            }
        }
    }
}

impl std::error::Error for RefineError {}
