// src/engine/view.rs
//
// Shared pixel storage with offset views.
// A view keeps its backing buffer alive through an Arc, so a cropped image
// can never outlive the decoded pixels it points into.

use crate::error::{HeifError, Result};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A byte window over reference-counted pixel storage.
///
/// Cloning a view or slicing it never copies pixel bytes.
#[derive(Clone)]
pub struct PixelView {
    storage: Arc<Vec<u8>>,
    offset: usize,
    len: usize,
}

impl PixelView {
    /// View covering the whole buffer.
    pub fn new(storage: Arc<Vec<u8>>) -> Self {
        let len = storage.len();
        Self {
            storage,
            offset: 0,
            len,
        }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self::new(Arc::new(data))
    }

    /// Sub-view starting `offset` bytes into this view, `len` bytes long.
    pub fn slice(&self, offset: usize, len: usize) -> Result<Self> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| HeifError::invalid_pixel_buffer(usize::MAX, self.len))?;
        if end > self.len {
            return Err(HeifError::invalid_pixel_buffer(end, self.len));
        }
        Ok(Self {
            storage: Arc::clone(&self.storage),
            offset: self.offset + offset,
            len,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte offset of this view into the original storage.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True when both views point into the same allocation.
    pub fn shares_storage_with(&self, other: &PixelView) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Number of live handles (views and external clones) on the storage.
    pub fn storage_refs(&self) -> usize {
        Arc::strong_count(&self.storage)
    }
}

impl Deref for PixelView {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for PixelView {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for PixelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelView")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("storage_len", &self.storage.len())
            .finish()
    }
}

impl PartialEq for PixelView {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for PixelView {}
