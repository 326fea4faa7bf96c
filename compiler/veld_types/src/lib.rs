//! IR type system for the Veld compiler.
//!
//! A canonicalizing (hash-consing) store over the compiler's composite
//! types, plus the abstract-type resolution engine that lets recursive
//! shapes be built through placeholders.
//!
//! # Canonical identity
//!
//! Every type is an [`Idx`] into a [`Pool`]. Requesting the same concrete
//! shape twice returns the same index, so type equality is index equality
//! and never a recursive structural comparison. That is also what keeps
//! comparison well-defined once the containment graph has cycles.
//!
//! # Abstract types and refinement
//!
//! A recursive shape is built by creating a placeholder with
//! [`Pool::opaque`], constructing composites over it, and resolving the
//! placeholder with [`Pool::refine_abstract_type_to`]:
//!
//! ```ignore
//! let mut pool = Pool::new();
//! let opaque = pool.opaque();
//! let ptr = pool.pointer(opaque)?;            // abstract
//! let node = pool.structure(&[ptr], false)?;  // abstract
//! pool.refine_abstract_type_to(opaque, node)?; // node is `struct S { S* }`
//! assert!(!pool.is_abstract(node));
//! ```
//!
//! Refinement repoints every edge that targeted the placeholder, in
//! place, and runs to completion before returning: no stale abstractness
//! flags or dangling edges are observable afterwards.

mod error;
mod flags;
mod idx;
mod item;
mod pool;
mod refine;
mod tag;

pub use error::ConstructionError;
pub use flags::{ParamAttrs, TypeFlags};
pub use idx::Idx;
pub use item::Item;
pub use pool::Pool;
pub use refine::RefineError;
pub use tag::Tag;
