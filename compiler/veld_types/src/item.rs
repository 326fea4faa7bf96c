//! Compact type item storage.
//!
//! Each type in the pool is stored as an `Item` with a tag and data field.
//! The interpretation of `data` depends on the tag.

use crate::{Idx, Tag};

/// A single type item in the pool.
///
/// This is the fundamental unit of type storage.
/// - `tag`: Identifies the type kind (see [`Tag`])
/// - `data`: Meaning depends on tag (bit width, element index, extra index,
///   or placeholder id)
#[derive(Copy, Clone, Debug)]
#[repr(C)]
pub struct Item {
    /// Type kind discriminant.
    pub tag: Tag,
    /// Tag-dependent data field.
    pub data: u32,
}

impl Item {
    /// Create a new item with the given tag and data.
    #[inline]
    pub const fn new(tag: Tag, data: u32) -> Self {
        Self { tag, data }
    }

    /// Create a primitive kind item.
    #[inline]
    pub const fn primitive(tag: Tag) -> Self {
        Self { tag, data: 0 }
    }

    /// Create an integer item. `bits` is stored directly in the data field.
    #[inline]
    pub const fn integer(bits: u32) -> Self {
        Self {
            tag: Tag::Integer,
            data: bits,
        }
    }

    /// Create a pointer item. The element index is stored directly.
    #[inline]
    pub const fn pointer(element: Idx) -> Self {
        Self {
            tag: Tag::Pointer,
            data: element.raw(),
        }
    }

    /// Create an item that references the extra array.
    ///
    /// `extra_idx` is the starting index in the extra array.
    #[inline]
    pub const fn with_extra(tag: Tag, extra_idx: u32) -> Self {
        Self {
            tag,
            data: extra_idx,
        }
    }

    /// Create a placeholder item with its identity-unique id.
    #[inline]
    pub const fn opaque(id: u32) -> Self {
        Self {
            tag: Tag::Opaque,
            data: id,
        }
    }

    /// Get the element index for pointer items.
    #[inline]
    pub const fn element(self) -> Idx {
        Idx::from_raw(self.data)
    }

    /// Get the extra array index for items where `tag.uses_extra()`.
    #[inline]
    pub const fn extra_idx(self) -> u32 {
        self.data
    }

    /// Get the bit width for integer items.
    #[inline]
    pub const fn width(self) -> u32 {
        self.data
    }

    /// Get the placeholder id for opaque items.
    #[inline]
    pub const fn opaque_id(self) -> u32 {
        self.data
    }
}

// Item is 5 bytes logically; repr(C) keeps the layout predictable.
const _: () = assert!(std::mem::size_of::<Item>() <= 8);
