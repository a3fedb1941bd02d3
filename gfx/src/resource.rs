//! Resource access.
//!
//! Loading and decompressing resources from game archives happens elsewhere; this
//! module only defines how the renderer asks for the resulting bytes
//! ([`ResourceProvider`]) and how it reads header fields out of them
//! ([`ResourceData`], [`ByteView`]).
//!
//! # Multi-byte fields
//!
//! Every 16 and 32 bit field of view and pic resources is stored in the byte order
//! of the platform the game shipped on ("SCI endian"): little endian for PC
//! releases, big endian for Macintosh ones. The accessors take the order from the
//! [`SciEndian`] the data was opened with, so header parsing is written once.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    View,
    Pic,
    Palette,
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::View => "view",
            Self::Pic => "pic",
            Self::Palette => "palette",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SciEndian {
    #[default]
    Little,
    Big,
}

/// Source of raw resource bytes.
pub trait ResourceProvider {
    /// The decompressed bytes of resource `id`, or `None` when the game does not
    /// have it.
    fn find_resource(&self, kind: ResourceType, id: u16) -> Option<Arc<[u8]>>;
}

/// A [`ResourceProvider`] backed by a map, for resources already in memory.
#[derive(Default)]
pub struct ResourceStore {
    resources: HashMap<(ResourceType, u16), Arc<[u8]>>,
}

impl ResourceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ResourceType, id: u16, data: impl Into<Arc<[u8]>>) {
        self.resources.insert((kind, id), data.into());
    }

    pub fn remove(&mut self, kind: ResourceType, id: u16) -> Option<Arc<[u8]>> {
        self.resources.remove(&(kind, id))
    }
}

impl ResourceProvider for ResourceStore {
    fn find_resource(&self, kind: ResourceType, id: u16) -> Option<Arc<[u8]>> {
        self.resources.get(&(kind, id)).cloned()
    }
}

/// Read-only, shared resource bytes.
///
/// Cloning only bumps the reference count: every cel built from the same resource
/// shares one allocation.
#[derive(Clone, Debug)]
pub struct ResourceData {
    bytes: Arc<[u8]>,
    endian: SciEndian,
}

impl ResourceData {
    #[must_use]
    pub const fn new(bytes: Arc<[u8]>, endian: SciEndian) -> Self {
        Self { bytes, endian }
    }

    #[must_use]
    pub fn view(&self) -> ByteView<'_> {
        ByteView::new(&self.bytes, self.endian)
    }
}

/// Bounds-checked, endian-aware field access over a byte slice.
#[derive(Clone, Copy, Debug)]
pub struct ByteView<'a> {
    bytes: &'a [u8],
    endian: SciEndian,
}

impl<'a> ByteView<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8], endian: SciEndian) -> Self {
        Self { bytes, endian }
    }

    #[must_use]
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[must_use]
    pub const fn endian(&self) -> SciEndian {
        self.endian
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CelError::Truncated`] if the range does not fit.
    pub fn slice(&self, what: &'static str, offset: usize, len: usize) -> Result<&'a [u8], CelError> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(CelError::Truncated {
                what,
                offset,
                len: self.bytes.len(),
            })
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N], CelError> {
        let slice = self.slice("header field", offset, N)?;
        let mut out = [0; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// # Errors
    ///
    /// Returns [`CelError::Truncated`] if `offset` is out of range.
    pub fn u8_at(&self, offset: usize) -> Result<u8, CelError> {
        Ok(self.array::<1>(offset)?[0])
    }

    /// # Errors
    ///
    /// Returns [`CelError::Truncated`] if `offset` is out of range.
    pub fn i8_at(&self, offset: usize) -> Result<i8, CelError> {
        Ok(i8::from_ne_bytes(self.array::<1>(offset)?))
    }

    /// # Errors
    ///
    /// Returns [`CelError::Truncated`] if the field does not fit.
    pub fn u16_at(&self, offset: usize) -> Result<u16, CelError> {
        let bytes = self.array::<2>(offset)?;
        Ok(match self.endian {
            SciEndian::Little => u16::from_le_bytes(bytes),
            SciEndian::Big => u16::from_be_bytes(bytes),
        })
    }

    /// # Errors
    ///
    /// Returns [`CelError::Truncated`] if the field does not fit.
    pub fn i16_at(&self, offset: usize) -> Result<i16, CelError> {
        let bytes = self.array::<2>(offset)?;
        Ok(match self.endian {
            SciEndian::Little => i16::from_le_bytes(bytes),
            SciEndian::Big => i16::from_be_bytes(bytes),
        })
    }

    /// # Errors
    ///
    /// Returns [`CelError::Truncated`] if the field does not fit.
    pub fn u32_at(&self, offset: usize) -> Result<u32, CelError> {
        let bytes = self.array::<4>(offset)?;
        Ok(match self.endian {
            SciEndian::Little => u32::from_le_bytes(bytes),
            SciEndian::Big => u32::from_be_bytes(bytes),
        })
    }

    /// A 32-bit offset field, widened for indexing.
    ///
    /// # Errors
    ///
    /// Returns [`CelError::Truncated`] if the field does not fit.
    pub fn offset_at(&self, offset: usize) -> Result<usize, CelError> {
        Ok(self.u32_at(offset)? as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn endian_aware_reads() {
        let bytes: Arc<[u8]> = Arc::from(vec![0x34, 0x12, 0x78, 0x56, 0xFF]);

        let le = ResourceData::new(bytes.clone(), SciEndian::Little);
        let le = le.view();
        assert_eq!(le.u16_at(0).unwrap(), 0x1234);
        assert_eq!(le.u32_at(0).unwrap(), 0x5678_1234);
        assert_eq!(le.i8_at(4).unwrap(), -1);

        let be = ResourceData::new(bytes, SciEndian::Big);
        let be = be.view();
        assert_eq!(be.u16_at(0).unwrap(), 0x3412);
        assert_eq!(be.i16_at(3).unwrap(), 0x56FF);
    }

    #[test]
    fn reads_past_the_end_fail() {
        let bytes = [1, 2, 3];
        let data = ByteView::new(&bytes, SciEndian::Little);
        assert_eq!(
            data.u32_at(0),
            Err(CelError::Truncated {
                what: "header field",
                offset: 0,
                len: 3
            })
        );
        assert!(data.slice("pixels", usize::MAX, 2).is_err());
        assert_eq!(data.slice("pixels", 1, 2).unwrap(), &[2, 3]);
    }

    #[test]
    fn store_lookup() {
        let mut store = ResourceStore::new();
        store.insert(ResourceType::View, 10, vec![1, 2, 3]);

        assert!(store.find_resource(ResourceType::View, 10).is_some());
        assert!(store.find_resource(ResourceType::Pic, 10).is_none());
        assert!(store.remove(ResourceType::View, 10).is_some());
        assert!(store.find_resource(ResourceType::View, 10).is_none());
    }
}
