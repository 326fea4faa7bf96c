//! The canonicalizing type pool.
//!
//! One `Pool` exists per compilation unit and owns every type node in it:
//! the flat item storage, the packed payload array, the per-kind uniquing
//! tables, and the subscription/forwarding state of the refinement engine.
//! All mutation goes through `&mut self` methods; there is no shared or
//! global state.
//!
//! Construction entry points live in `pool/construct.rs`, the uniquing
//! tables in `pool/tables.rs`, debug formatting in `pool/format.rs`, and
//! the refinement engine in `refine/`.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::flags::ParamAttrs;
use crate::refine::Edge;
use crate::{Idx, Item, Tag, TypeFlags};

mod construct;
mod format;
pub(crate) mod tables;

use self::tables::TypeTables;

/// The type-system context: canonical storage for every type in one
/// compilation unit.
///
/// Identical concrete construction requests are guaranteed to return the
/// same [`Idx`] for the lifetime of the pool. Abstract types (those still
/// containing an unresolved placeholder) are tracked by identity only and
/// enter the uniquing tables when they become concrete.
pub struct Pool {
    /// One item per type node, indexed by `Idx`.
    pub(crate) items: Vec<Item>,
    /// Packed payload words for multi-word kinds.
    pub(crate) extra: Vec<u32>,
    /// Cached flags per node, kept consistent by the refinement engine.
    pub(crate) node_flags: Vec<TypeFlags>,
    /// Per-kind structural-key → canonical-node tables.
    pub(crate) tables: TypeTables,
    /// Containment edges subscribed to each abstract target, in
    /// subscription order (stable, so collapse order is reproducible).
    pub(crate) watchers: FxHashMap<Idx, Vec<Edge>>,
    /// Forwarding links left behind by resolved placeholders and
    /// collapsed duplicates.
    pub(crate) forward: FxHashMap<Idx, Idx>,
    /// Identity counter for placeholders.
    pub(crate) next_opaque_id: u32,
}

impl Pool {
    /// Minimum representable integer bit width.
    pub const MIN_INT_BITS: u32 = 1;
    /// Maximum representable integer bit width.
    pub const MAX_INT_BITS: u32 = (1 << 23) - 1;

    /// Create a pool with the primitive kinds and common integer widths
    /// pre-interned at their fixed indices.
    pub fn new() -> Self {
        let mut pool = Self {
            items: Vec::with_capacity(256),
            extra: Vec::with_capacity(256),
            node_flags: Vec::with_capacity(256),
            tables: TypeTables::default(),
            watchers: FxHashMap::default(),
            forward: FxHashMap::default(),
            next_opaque_id: 0,
        };

        // Primitive kinds at indices 0-3.
        pool.push_item(Item::primitive(Tag::Void), TypeFlags::IS_PRIMITIVE);
        pool.push_item(
            Item::primitive(Tag::Float),
            TypeFlags::IS_PRIMITIVE | TypeFlags::IS_FLOATING | TypeFlags::IS_FIRST_CLASS,
        );
        pool.push_item(
            Item::primitive(Tag::Double),
            TypeFlags::IS_PRIMITIVE | TypeFlags::IS_FLOATING | TypeFlags::IS_FIRST_CLASS,
        );
        pool.push_item(Item::primitive(Tag::Label), TypeFlags::IS_PRIMITIVE);

        // Common integer widths at indices 4-8, seeded into the integer
        // table so on-demand requests find them.
        for (idx, bits) in [
            (Idx::I1, 1),
            (Idx::I8, 8),
            (Idx::I16, 16),
            (Idx::I32, 32),
            (Idx::I64, 64),
        ] {
            let _got = pool.push_item(Item::integer(bits), TypeFlags::IS_FIRST_CLASS);
            debug_assert_eq!(_got, idx);
            pool.tables.insert_integer(bits, idx);
        }

        // Pad the reserved range so dynamic indices start at FIRST_DYNAMIC.
        while pool.items.len() < Idx::FIRST_DYNAMIC as usize {
            pool.push_item(Item::primitive(Tag::Void), TypeFlags::empty());
        }

        pool
    }

    /// Number of nodes in the pool (including pre-interned and reserved
    /// slots, and nodes that have since been refined away).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the pool holds only the pre-interned entries.
    pub fn is_empty(&self) -> bool {
        self.len() <= Idx::FIRST_DYNAMIC as usize
    }

    pub(crate) fn push_item(&mut self, item: Item, flags: TypeFlags) -> Idx {
        let raw = u32::try_from(self.items.len())
            .unwrap_or_else(|_| panic!("type pool exhausted (u32 indices)"));
        self.items.push(item);
        self.node_flags.push(flags);
        Idx::from_raw(raw)
    }

    pub(crate) fn push_extra(&mut self, words: &[u32]) -> u32 {
        let base = u32::try_from(self.extra.len())
            .unwrap_or_else(|_| panic!("type pool payload storage exhausted"));
        self.extra.extend_from_slice(words);
        base
    }

    // ========================================
    // Node queries
    // ========================================

    /// Get the kind tag of a type.
    #[inline]
    pub fn tag(&self, idx: Idx) -> Tag {
        self.items[idx.raw() as usize].tag
    }

    /// Get the raw data word of a type.
    #[inline]
    pub fn data(&self, idx: Idx) -> u32 {
        self.items[idx.raw() as usize].data
    }

    /// Get the cached flags of a type.
    #[inline]
    pub fn flags(&self, idx: Idx) -> TypeFlags {
        self.node_flags[idx.raw() as usize]
    }

    /// Check if a type's final shape is not yet known (it is, or
    /// transitively contains, an unresolved placeholder).
    #[inline]
    pub fn is_abstract(&self, idx: Idx) -> bool {
        self.flags(idx).is_abstract()
    }

    /// Check if a node has been refined away (a resolved placeholder or a
    /// collapsed duplicate). Use [`Pool::resolve`] to reach its survivor.
    #[inline]
    pub fn is_forwarded(&self, idx: Idx) -> bool {
        self.flags(idx).is_forwarded()
    }

    // ========================================
    // Per-kind accessors
    // ========================================

    /// Bit width of an integer type.
    pub fn integer_width(&self, idx: Idx) -> u32 {
        assert_eq!(self.tag(idx), Tag::Integer, "integer_width on {}", self.tag(idx));
        self.items[idx.raw() as usize].width()
    }

    /// Bitmask with ones for every bit an unsigned value of this integer
    /// type can set. Meaningful for widths up to 64.
    pub fn integer_bit_mask(&self, idx: Idx) -> u64 {
        let bits = self.integer_width(idx);
        if bits >= 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        }
    }

    /// Check if an integer type's width is a power-of-two number of
    /// 8-bit bytes.
    pub fn is_power_of_two_byte_width(&self, idx: Idx) -> bool {
        let bits = self.integer_width(idx);
        bits % 8 == 0 && (bits / 8).is_power_of_two()
    }

    /// Element type of a sequential kind (pointer, array, vector).
    pub fn element_type(&self, idx: Idx) -> Idx {
        let item = self.items[idx.raw() as usize];
        match item.tag {
            Tag::Pointer => item.element(),
            Tag::Array | Tag::Vector => Idx::from_raw(self.extra[item.extra_idx() as usize]),
            other => panic!("element_type on {other}"),
        }
    }

    /// Element count of an array type.
    pub fn array_len(&self, idx: Idx) -> u64 {
        assert_eq!(self.tag(idx), Tag::Array, "array_len on {}", self.tag(idx));
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        u64::from(self.extra[base + 1]) | (u64::from(self.extra[base + 2]) << 32)
    }

    /// Element count of a vector type.
    pub fn vector_len(&self, idx: Idx) -> u32 {
        assert_eq!(self.tag(idx), Tag::Vector, "vector_len on {}", self.tag(idx));
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        self.extra[base + 1]
    }

    /// Total bit width of a vector type: element count × element width.
    pub fn vector_bit_width(&self, idx: Idx) -> u64 {
        let elem = self.element_type(idx);
        u64::from(self.vector_len(idx)) * self.primitive_size_in_bits(elem)
    }

    /// Return type of a function type.
    pub fn function_return(&self, idx: Idx) -> Idx {
        assert_eq!(self.tag(idx), Tag::Function, "function_return on {}", self.tag(idx));
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        Idx::from_raw(self.extra[base + 2])
    }

    /// Number of fixed parameters of a function type (varargs excluded).
    pub fn function_param_count(&self, idx: Idx) -> usize {
        assert_eq!(self.tag(idx), Tag::Function, "function_param_count on {}", self.tag(idx));
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        self.extra[base + 1] as usize
    }

    /// The `i`-th fixed parameter type of a function type.
    pub fn function_param(&self, idx: Idx, i: usize) -> Idx {
        let count = self.function_param_count(idx);
        assert!(i < count, "parameter index {i} out of range ({count} params)");
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        Idx::from_raw(self.extra[base + 3 + i])
    }

    /// All fixed parameter types of a function type.
    pub fn function_params(&self, idx: Idx) -> Vec<Idx> {
        let count = self.function_param_count(idx);
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        self.extra[base + 3..base + 3 + count]
            .iter()
            .map(|&raw| Idx::from_raw(raw))
            .collect()
    }

    /// Check if a function type accepts variable arguments.
    pub fn function_is_vararg(&self, idx: Idx) -> bool {
        assert_eq!(self.tag(idx), Tag::Function, "function_is_vararg on {}", self.tag(idx));
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        self.extra[base] & 0b01 != 0
    }

    pub(crate) fn function_has_attrs(&self, idx: Idx) -> bool {
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        self.extra[base] & 0b10 != 0
    }

    /// Attribute bits for slot `i` of a function type.
    ///
    /// Slot 0 is the return slot; fixed parameters are slots `1..=count`.
    /// Functions carrying no attributes report the empty set everywhere.
    #[expect(clippy::cast_possible_truncation, reason = "attribute words store u16 bits")]
    pub fn function_param_attrs(&self, idx: Idx, i: usize) -> ParamAttrs {
        let count = self.function_param_count(idx);
        assert!(i <= count, "attribute slot {i} out of range ({count} params)");
        if !self.function_has_attrs(idx) {
            return ParamAttrs::empty();
        }
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        ParamAttrs::from_bits_truncate(self.extra[base + 3 + count + i] as u16)
    }

    /// Check if attribute `attr` is set on slot `i` of a function type.
    pub fn param_has_attr(&self, idx: Idx, i: usize, attr: ParamAttrs) -> bool {
        self.function_param_attrs(idx, i).contains(attr)
    }

    /// Check if a function type returns its result through a hidden
    /// struct-return pointer (first fixed parameter carries `STRUCT_RET`).
    pub fn function_is_struct_return(&self, idx: Idx) -> bool {
        self.function_param_count(idx) > 0 && self.param_has_attr(idx, 1, ParamAttrs::STRUCT_RET)
    }

    /// Number of fields of a struct type.
    pub fn struct_field_count(&self, idx: Idx) -> usize {
        assert_eq!(self.tag(idx), Tag::Struct, "struct_field_count on {}", self.tag(idx));
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        self.extra[base + 1] as usize
    }

    /// The `i`-th field type of a struct type.
    pub fn struct_field(&self, idx: Idx, i: usize) -> Idx {
        let count = self.struct_field_count(idx);
        assert!(i < count, "field index {i} out of range ({count} fields)");
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        Idx::from_raw(self.extra[base + 2 + i])
    }

    /// All field types of a struct type.
    pub fn struct_fields(&self, idx: Idx) -> Vec<Idx> {
        let count = self.struct_field_count(idx);
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        self.extra[base + 2..base + 2 + count]
            .iter()
            .map(|&raw| Idx::from_raw(raw))
            .collect()
    }

    /// Check if a struct type is packed (no inter-field padding).
    pub fn struct_is_packed(&self, idx: Idx) -> bool {
        assert_eq!(self.tag(idx), Tag::Struct, "struct_is_packed on {}", self.tag(idx));
        let base = self.items[idx.raw() as usize].extra_idx() as usize;
        self.extra[base] & 0b01 != 0
    }

    /// Identity id of a placeholder.
    pub fn opaque_id(&self, idx: Idx) -> u32 {
        assert_eq!(self.tag(idx), Tag::Opaque, "opaque_id on {}", self.tag(idx));
        self.items[idx.raw() as usize].opaque_id()
    }

    // ========================================
    // Containment edges
    // ========================================

    /// Number of containment edges of a node.
    ///
    /// Function edge 0 is the return type, edges `1..=n` the parameters;
    /// struct edges are the fields in order; sequential kinds have the
    /// single element edge.
    pub fn contained_count(&self, idx: Idx) -> usize {
        match self.tag(idx) {
            Tag::Pointer | Tag::Array | Tag::Vector => 1,
            Tag::Struct => self.struct_field_count(idx),
            Tag::Function => 1 + self.function_param_count(idx),
            _ => 0,
        }
    }

    /// Target of the `pos`-th containment edge of a node.
    pub fn contained(&self, idx: Idx, pos: usize) -> Idx {
        match self.tag(idx) {
            Tag::Pointer | Tag::Array | Tag::Vector => {
                assert_eq!(pos, 0, "sequential kinds have a single element edge");
                self.element_type(idx)
            }
            Tag::Struct => self.struct_field(idx, pos),
            Tag::Function => {
                if pos == 0 {
                    self.function_return(idx)
                } else {
                    self.function_param(idx, pos - 1)
                }
            }
            other => panic!("contained on {other}"),
        }
    }

    /// Repoint the `pos`-th containment edge of a node in place.
    ///
    /// Storage-level primitive used by the refinement engine; callers are
    /// responsible for flag recomputation and table maintenance.
    pub(crate) fn write_contained(&mut self, user: Idx, pos: u32, target: Idx) {
        let item = self.items[user.raw() as usize];
        match item.tag {
            Tag::Pointer => {
                debug_assert_eq!(pos, 0);
                self.items[user.raw() as usize].data = target.raw();
            }
            Tag::Array | Tag::Vector => {
                debug_assert_eq!(pos, 0);
                self.extra[item.extra_idx() as usize] = target.raw();
            }
            Tag::Struct | Tag::Function => {
                self.extra[item.extra_idx() as usize + 2 + pos as usize] = target.raw();
            }
            other => {
                tracing::error!(%user, %pos, tag = %other, "edge repoint on kind without edges");
                debug_assert!(false, "edge repoint on kind without edges");
            }
        }
    }

    // ========================================
    // Indexing and size queries
    // ========================================

    /// Check if `i` is a valid element index into an indexable type.
    ///
    /// Struct indices must name an existing field; sequential kinds accept
    /// any index.
    pub fn index_valid(&self, idx: Idx, i: u64) -> bool {
        match self.tag(idx) {
            Tag::Struct => i < self.struct_field_count(idx) as u64,
            tag => tag.is_sequential(),
        }
    }

    /// Type of the element at index `i`, or `None` if the index is
    /// invalid or the type is not indexable.
    pub fn type_at_index(&self, idx: Idx, i: u64) -> Option<Idx> {
        if !self.index_valid(idx, i) {
            return None;
        }
        match self.tag(idx) {
            #[expect(clippy::cast_possible_truncation, reason = "index_valid bounds i by field count")]
            Tag::Struct => Some(self.struct_field(idx, i as usize)),
            _ => Some(self.element_type(idx)),
        }
    }

    /// Size in bits of a scalar type (integers: width; float: 32;
    /// double: 64; vectors: total bit width). Zero for everything else.
    pub fn primitive_size_in_bits(&self, idx: Idx) -> u64 {
        match self.tag(idx) {
            Tag::Integer => u64::from(self.integer_width(idx)),
            Tag::Float => 32,
            Tag::Double => 64,
            Tag::Vector => self.vector_bit_width(idx),
            _ => 0,
        }
    }

    /// Check if values of this type occupy storage with a known size.
    ///
    /// Void, label, function and unresolved placeholder types are
    /// unsized; aggregates are sized iff all their members are.
    pub fn is_sized(&self, idx: Idx) -> bool {
        let mut visiting = FxHashSet::default();
        self.is_sized_inner(idx, &mut visiting)
    }

    fn is_sized_inner(&self, idx: Idx, visiting: &mut FxHashSet<Idx>) -> bool {
        match self.tag(idx) {
            Tag::Integer | Tag::Float | Tag::Double | Tag::Pointer | Tag::Vector => true,
            Tag::Void | Tag::Label | Tag::Function | Tag::Opaque => false,
            Tag::Array => {
                if !visiting.insert(idx) {
                    return true;
                }
                self.is_sized_inner(self.element_type(idx), visiting)
            }
            Tag::Struct => {
                if !visiting.insert(idx) {
                    return true;
                }
                (0..self.struct_field_count(idx))
                    .all(|i| self.is_sized_inner(self.struct_field(idx, i), visiting))
            }
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("len", &self.len())
            .field("extra_len", &self.extra.len())
            .finish()
    }
}
