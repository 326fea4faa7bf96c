//! Per-kind uniquing tables.
//!
//! One table per composite kind maps a structural key to the single
//! canonical node with that shape. Keys compare contained types by `Idx`
//! identity, never by recursive structural comparison; that is what keeps
//! hash-consing well-defined over a graph that can contain cycles.
//!
//! Only concrete nodes are table-resident. An abstract composite's key is
//! not final, so it is tracked by identity alone until the refinement
//! engine promotes it (see `refine/`).

use rustc_hash::FxHashMap;

use crate::flags::ParamAttrs;
use crate::{Idx, Pool, Tag};

/// Structural key of an array type.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct ArrayKey {
    pub element: Idx,
    pub len: u64,
}

/// Structural key of a vector type.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct VectorKey {
    pub element: Idx,
    pub len: u32,
}

/// Structural key of a struct type. Packing is part of the key: identical
/// fields with different packing are distinct types.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct StructKey {
    pub fields: Box<[Idx]>,
    pub packed: bool,
}

/// Structural key of a function type. Attribute bits participate in the
/// key but carry no containment edges.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct FunctionKey {
    pub ret: Idx,
    pub params: Box<[Idx]>,
    pub is_vararg: bool,
    pub attrs: Box<[ParamAttrs]>,
}

/// A structural key for any uniquable kind.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) enum TypeKey {
    Integer(u32),
    Pointer(Idx),
    Array(ArrayKey),
    Vector(VectorKey),
    Struct(StructKey),
    Function(FunctionKey),
}

/// The per-kind canonical-instance tables.
#[derive(Default, Debug)]
pub(crate) struct TypeTables {
    integers: FxHashMap<u32, Idx>,
    pointers: FxHashMap<Idx, Idx>,
    arrays: FxHashMap<ArrayKey, Idx>,
    vectors: FxHashMap<VectorKey, Idx>,
    structs: FxHashMap<StructKey, Idx>,
    functions: FxHashMap<FunctionKey, Idx>,
}

impl TypeTables {
    /// Find the canonical node for a key, if one exists.
    pub(crate) fn lookup(&self, key: &TypeKey) -> Option<Idx> {
        match key {
            TypeKey::Integer(bits) => self.integers.get(bits).copied(),
            TypeKey::Pointer(element) => self.pointers.get(element).copied(),
            TypeKey::Array(k) => self.arrays.get(k).copied(),
            TypeKey::Vector(k) => self.vectors.get(k).copied(),
            TypeKey::Struct(k) => self.structs.get(k).copied(),
            TypeKey::Function(k) => self.functions.get(k).copied(),
        }
    }

    /// Register a node as the canonical instance for its key.
    pub(crate) fn insert(&mut self, key: TypeKey, idx: Idx) {
        let prev = match key {
            TypeKey::Integer(bits) => self.integers.insert(bits, idx),
            TypeKey::Pointer(element) => self.pointers.insert(element, idx),
            TypeKey::Array(k) => self.arrays.insert(k, idx),
            TypeKey::Vector(k) => self.vectors.insert(k, idx),
            TypeKey::Struct(k) => self.structs.insert(k, idx),
            TypeKey::Function(k) => self.functions.insert(k, idx),
        };
        if let Some(prev) = prev {
            // Two canonical nodes alive for one key would break the
            // identity guarantee; this must never happen.
            tracing::error!(%idx, %prev, "two canonical instances for one structural key");
            debug_assert!(false, "two canonical instances for one structural key");
        }
    }

    /// Drop a node's table entry (its key is about to change during a
    /// collapse cascade). A key with no entry is a harmless no-op.
    pub(crate) fn remove(&mut self, key: &TypeKey) {
        match key {
            TypeKey::Integer(bits) => self.integers.remove(bits),
            TypeKey::Pointer(element) => self.pointers.remove(element),
            TypeKey::Array(k) => self.arrays.remove(k),
            TypeKey::Vector(k) => self.vectors.remove(k),
            TypeKey::Struct(k) => self.structs.remove(k),
            TypeKey::Function(k) => self.functions.remove(k),
        };
    }

    /// Seed an integer entry during pool construction.
    pub(crate) fn insert_integer(&mut self, bits: u32, idx: Idx) {
        self.integers.insert(bits, idx);
    }

    /// Total number of canonical entries across all kinds.
    #[cfg(test)]
    pub(crate) fn canonical_count(&self) -> usize {
        self.integers.len()
            + self.pointers.len()
            + self.arrays.len()
            + self.vectors.len()
            + self.structs.len()
            + self.functions.len()
    }
}

impl Pool {
    /// Compute the structural key of a node from its current storage.
    ///
    /// Returns `None` for kinds that are never shape-uniqued (primitives
    /// and placeholders).
    pub(crate) fn structural_key(&self, idx: Idx) -> Option<TypeKey> {
        match self.tag(idx) {
            Tag::Integer => Some(TypeKey::Integer(self.integer_width(idx))),
            Tag::Pointer => Some(TypeKey::Pointer(self.element_type(idx))),
            Tag::Array => Some(TypeKey::Array(ArrayKey {
                element: self.element_type(idx),
                len: self.array_len(idx),
            })),
            Tag::Vector => Some(TypeKey::Vector(VectorKey {
                element: self.element_type(idx),
                len: self.vector_len(idx),
            })),
            Tag::Struct => Some(TypeKey::Struct(StructKey {
                fields: self.struct_fields(idx).into_boxed_slice(),
                packed: self.struct_is_packed(idx),
            })),
            Tag::Function => {
                let count = self.function_param_count(idx);
                let attrs = if self.function_has_attrs(idx) {
                    (0..=count)
                        .map(|i| self.function_param_attrs(idx, i))
                        .collect()
                } else {
                    Box::default()
                };
                Some(TypeKey::Function(FunctionKey {
                    ret: self.function_return(idx),
                    params: self.function_params(idx).into_boxed_slice(),
                    is_vararg: self.function_is_vararg(idx),
                    attrs,
                }))
            }
            _ => None,
        }
    }
}
