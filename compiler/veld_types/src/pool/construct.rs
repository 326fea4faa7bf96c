//! Type construction entry points.
//!
//! Each constructor validates the requested shape, then either returns
//! the existing canonical node for the structural key or allocates and
//! registers a new one. A composite built from at least one abstract
//! component is never table-resident at construction time: its key is not
//! final, so it is tracked by identity until refinement promotes it.
//!
//! Component handles are passed through [`Pool::resolve_readonly`] at the
//! boundary, so stale handles to refined-away nodes collapse to their
//! survivor instead of corrupting structural keys.

use smallvec::SmallVec;

use super::tables::{ArrayKey, FunctionKey, StructKey, TypeKey, VectorKey};
use crate::flags::ParamAttrs;
use crate::refine::Edge;
use crate::{ConstructionError, Idx, Item, Pool, Tag, TypeFlags};

impl Pool {
    /// Get or create the integer type of the given bit width.
    ///
    /// Widths outside `MIN_INT_BITS..=MAX_INT_BITS` are rejected.
    pub fn integer(&mut self, bits: u32) -> Result<Idx, ConstructionError> {
        if !(Self::MIN_INT_BITS..=Self::MAX_INT_BITS).contains(&bits) {
            return Err(ConstructionError::WidthOutOfRange { bits });
        }
        let key = TypeKey::Integer(bits);
        if let Some(existing) = self.tables.lookup(&key) {
            return Ok(existing);
        }
        let idx = self.push_item(Item::integer(bits), TypeFlags::IS_FIRST_CLASS);
        self.tables.insert(key, idx);
        Ok(idx)
    }

    /// Get or create the pointer type to the given element type.
    pub fn pointer(&mut self, element: Idx) -> Result<Idx, ConstructionError> {
        let element = self.resolve_readonly(element);
        if matches!(self.tag(element), Tag::Void | Tag::Label) {
            return Err(ConstructionError::InvalidElementType { element });
        }

        if !self.is_abstract(element) {
            let key = TypeKey::Pointer(element);
            if let Some(existing) = self.tables.lookup(&key) {
                return Ok(existing);
            }
            let idx = self.push_item(Item::pointer(element), TypeFlags::IS_FIRST_CLASS);
            self.tables.insert(key, idx);
            return Ok(idx);
        }

        let idx = self.push_item(
            Item::pointer(element),
            TypeFlags::IS_FIRST_CLASS | TypeFlags::ABSTRACT,
        );
        self.subscribe(element, Edge { user: idx, pos: 0 });
        Ok(idx)
    }

    /// Get or create the array type with the given element type and
    /// element count. Zero-length arrays are legal.
    pub fn array(&mut self, element: Idx, len: u64) -> Result<Idx, ConstructionError> {
        let element = self.resolve_readonly(element);
        if matches!(self.tag(element), Tag::Void | Tag::Label) {
            return Err(ConstructionError::InvalidElementType { element });
        }

        let is_abstract = self.is_abstract(element);
        if !is_abstract {
            let key = TypeKey::Array(ArrayKey { element, len });
            if let Some(existing) = self.tables.lookup(&key) {
                return Ok(existing);
            }
        }

        #[expect(clippy::cast_possible_truncation, reason = "storing u64 as two u32 halves")]
        let payload = [element.raw(), len as u32, (len >> 32) as u32];
        let base = self.push_extra(&payload);
        let flags = TypeFlags::propagate_from(self.flags(element));
        let idx = self.push_item(Item::with_extra(Tag::Array, base), flags);
        if is_abstract {
            self.subscribe(element, Edge { user: idx, pos: 0 });
        } else {
            self.tables.insert(TypeKey::Array(ArrayKey { element, len }), idx);
        }
        Ok(idx)
    }

    /// Get or create the vector type with the given element type and
    /// element count.
    ///
    /// Vector elements must be fixed-width scalars (integer or float), so
    /// vector types are always concrete. The count must be non-zero.
    pub fn vector(&mut self, element: Idx, len: u32) -> Result<Idx, ConstructionError> {
        let element = self.resolve_readonly(element);
        if len == 0 {
            return Err(ConstructionError::ZeroLengthVector);
        }
        if !matches!(self.tag(element), Tag::Integer | Tag::Float | Tag::Double) {
            return Err(ConstructionError::InvalidVectorElement { element });
        }

        let key = TypeKey::Vector(VectorKey { element, len });
        if let Some(existing) = self.tables.lookup(&key) {
            return Ok(existing);
        }
        let base = self.push_extra(&[element.raw(), len]);
        let idx = self.push_item(Item::with_extra(Tag::Vector, base), TypeFlags::IS_FIRST_CLASS);
        self.tables.insert(key, idx);
        Ok(idx)
    }

    /// Get or create the struct type with the given field types.
    ///
    /// Packing is part of the structural key: identical fields with
    /// different packing are distinct types.
    pub fn structure(&mut self, fields: &[Idx], packed: bool) -> Result<Idx, ConstructionError> {
        let mut resolved: SmallVec<[Idx; 8]> = SmallVec::with_capacity(fields.len());
        let mut flags = TypeFlags::empty();
        for &field in fields {
            let field = self.resolve_readonly(field);
            if matches!(self.tag(field), Tag::Void | Tag::Label) {
                return Err(ConstructionError::InvalidElementType { element: field });
            }
            flags |= TypeFlags::propagate_from(self.flags(field));
            resolved.push(field);
        }

        if !flags.is_abstract() {
            let key = TypeKey::Struct(StructKey {
                fields: resolved.to_vec().into_boxed_slice(),
                packed,
            });
            if let Some(existing) = self.tables.lookup(&key) {
                return Ok(existing);
            }
            let idx = self.alloc_struct(&resolved, packed, flags);
            self.tables.insert(key, idx);
            return Ok(idx);
        }

        let idx = self.alloc_struct(&resolved, packed, flags);
        for (pos, &field) in resolved.iter().enumerate() {
            if self.is_abstract(field) {
                #[expect(clippy::cast_possible_truncation, reason = "field count fits u32")]
                self.subscribe(field, Edge { user: idx, pos: pos as u32 });
            }
        }
        Ok(idx)
    }

    fn alloc_struct(&mut self, fields: &[Idx], packed: bool, flags: TypeFlags) -> Idx {
        let mut payload: SmallVec<[u32; 10]> = SmallVec::with_capacity(fields.len() + 2);
        payload.push(u32::from(packed));
        #[expect(clippy::cast_possible_truncation, reason = "field count fits u32")]
        payload.push(fields.len() as u32);
        payload.extend(fields.iter().map(|f| f.raw()));
        let base = self.push_extra(&payload);
        self.push_item(Item::with_extra(Tag::Struct, base), flags)
    }

    /// Get or create the function type with the given return type,
    /// parameter types, variadic flag and optional attribute list.
    ///
    /// The attribute list must be empty or have exactly `params.len() + 1`
    /// entries; slot 0 refers to the return value. An all-empty attribute
    /// list is canonicalized to the empty list.
    pub fn function(
        &mut self,
        ret: Idx,
        params: &[Idx],
        is_vararg: bool,
        attrs: &[ParamAttrs],
    ) -> Result<Idx, ConstructionError> {
        let ret = self.resolve_readonly(ret);
        if self.tag(ret) == Tag::Label {
            return Err(ConstructionError::InvalidReturnType { ret });
        }
        let mut resolved: SmallVec<[Idx; 8]> = SmallVec::with_capacity(params.len());
        let mut flags = TypeFlags::propagate_from(self.flags(ret));
        for (index, &param) in params.iter().enumerate() {
            let param = self.resolve_readonly(param);
            if matches!(self.tag(param), Tag::Void | Tag::Label) {
                return Err(ConstructionError::InvalidParameterType { index, param });
            }
            flags |= TypeFlags::propagate_from(self.flags(param));
            resolved.push(param);
        }

        if !attrs.is_empty() && attrs.len() != params.len() + 1 {
            return Err(ConstructionError::AttrCountMismatch {
                expected: params.len() + 1,
                found: attrs.len(),
            });
        }
        // An all-empty attribute list must hash like no list at all.
        let attrs: &[ParamAttrs] = if attrs.iter().all(|a| a.is_empty()) {
            &[]
        } else {
            attrs
        };

        if !flags.is_abstract() {
            let key = TypeKey::Function(FunctionKey {
                ret,
                params: resolved.to_vec().into_boxed_slice(),
                is_vararg,
                attrs: attrs.to_vec().into_boxed_slice(),
            });
            if let Some(existing) = self.tables.lookup(&key) {
                return Ok(existing);
            }
            let idx = self.alloc_function(ret, &resolved, is_vararg, attrs, flags);
            self.tables.insert(key, idx);
            return Ok(idx);
        }

        let idx = self.alloc_function(ret, &resolved, is_vararg, attrs, flags);
        if self.is_abstract(ret) {
            self.subscribe(ret, Edge { user: idx, pos: 0 });
        }
        for (i, &param) in resolved.iter().enumerate() {
            if self.is_abstract(param) {
                #[expect(clippy::cast_possible_truncation, reason = "param count fits u32")]
                self.subscribe(param, Edge { user: idx, pos: (i + 1) as u32 });
            }
        }
        Ok(idx)
    }

    fn alloc_function(
        &mut self,
        ret: Idx,
        params: &[Idx],
        is_vararg: bool,
        attrs: &[ParamAttrs],
        flags: TypeFlags,
    ) -> Idx {
        let meta = u32::from(is_vararg) | (u32::from(!attrs.is_empty()) << 1);
        let mut payload: SmallVec<[u32; 12]> = SmallVec::with_capacity(params.len() + 3);
        payload.push(meta);
        #[expect(clippy::cast_possible_truncation, reason = "param count fits u32")]
        payload.push(params.len() as u32);
        payload.push(ret.raw());
        payload.extend(params.iter().map(|p| p.raw()));
        payload.extend(attrs.iter().map(|a| u32::from(a.bits())));
        let base = self.push_extra(&payload);
        self.push_item(Item::with_extra(Tag::Function, base), flags)
    }

    /// Create a brand-new placeholder type.
    ///
    /// Placeholders are identity-unique: every call yields a distinct
    /// node, never shape-uniqued. A placeholder exists until
    /// [`Pool::refine_abstract_type_to`] resolves it.
    pub fn opaque(&mut self) -> Idx {
        let id = self.next_opaque_id;
        self.next_opaque_id += 1;
        self.push_item(Item::opaque(id), TypeFlags::ABSTRACT)
    }
}
