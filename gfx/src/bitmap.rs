//! In-memory bitmaps.
//!
//! Scripts and engine code render text, save backgrounds and build effects into
//! plain bitmaps that are then drawn like any other cel. A bitmap keeps its pixels
//! behind a header laid out like a cel header, so the same uncompressed row reader
//! serves both:
//!
//! | Offset | Size | Field                         |
//! |--------|------|-------------------------------|
//! | 0      | 2    | width                         |
//! | 2      | 2    | height                        |
//! | 4      | 2    | origin x                      |
//! | 6      | 2    | origin y                      |
//! | 8      | 1    | skip colour                   |
//! | 9      | 1    | compression (always 0)        |
//! | 10     | 2    | flags (bit 1: remap)          |
//! | 12     | 4    | pixel data size               |
//! | 20     | 4    | hunk palette offset (0: none) |
//! | 24     | 4    | pixel data offset             |
//! | 28     | 4    | uncompressed data offset      |
//! | 32     | 4    | control offset (0)            |
//! | 36     | 2    | x resolution                  |
//! | 38     | 2    | y resolution                  |
//!
//! Header fields are little endian.

use std::collections::HashMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::rect::Point;
use crate::resource::{ByteView, SciEndian};

pub const BITMAP_HEADER_SIZE: usize = 46;

#[allow(clippy::cast_possible_truncation)]
const HEADER_SIZE_FIELD: u32 = BITMAP_HEADER_SIZE as u32;

const REMAP_FLAG: u16 = 0b10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BitmapHandle(pub u32);

impl Display for BitmapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:04x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    data: Vec<u8>,
}

impl Bitmap {
    /// A bitmap filled with `skip_color`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: u16,
        height: u16,
        skip_color: u8,
        origin: Point,
        x_resolution: u16,
        y_resolution: u16,
        remap: bool,
    ) -> Self {
        let data_size = usize::from(width) * usize::from(height);
        let mut data = vec![0; BITMAP_HEADER_SIZE + data_size];
        data[BITMAP_HEADER_SIZE..].fill(skip_color);

        let mut bitmap = Self { data };
        bitmap.write_u16(0, width);
        bitmap.write_u16(2, height);
        bitmap.set_origin(origin);
        bitmap.data[8] = skip_color;
        bitmap.data[9] = 0;
        bitmap.write_u16(10, 0);
        bitmap.set_remap(remap);
        bitmap.write_u32(12, u32::from(width) * u32::from(height));
        bitmap.write_u32(20, 0);
        bitmap.write_u32(24, HEADER_SIZE_FIELD);
        bitmap.write_u32(28, HEADER_SIZE_FIELD);
        bitmap.write_u32(32, 0);
        bitmap.write_u16(36, x_resolution);
        bitmap.write_u16(38, y_resolution);
        bitmap
    }

    fn read_u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.data[offset], self.data[offset + 1]])
    }

    fn write_u16(&mut self, offset: usize, value: u16) {
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.read_u16(0)
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.read_u16(2)
    }

    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn origin(&self) -> Point {
        Point::new(
            i32::from(self.read_u16(4) as i16),
            i32::from(self.read_u16(6) as i16),
        )
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_origin(&mut self, origin: Point) {
        self.write_u16(4, origin.x as i16 as u16);
        self.write_u16(6, origin.y as i16 as u16);
    }

    #[must_use]
    pub fn skip_color(&self) -> u8 {
        self.data[8]
    }

    #[must_use]
    pub fn remap(&self) -> bool {
        self.read_u16(10) & REMAP_FLAG != 0
    }

    pub fn set_remap(&mut self, remap: bool) {
        let flags = self.read_u16(10);
        let flags = if remap {
            flags | REMAP_FLAG
        } else {
            flags & !REMAP_FLAG
        };
        self.write_u16(10, flags);
    }

    #[must_use]
    pub fn x_resolution(&self) -> u16 {
        self.read_u16(36)
    }

    #[must_use]
    pub fn y_resolution(&self) -> u16 {
        self.read_u16(38)
    }

    /// Header plus pixels, as handed to the row readers.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn view(&self) -> ByteView<'_> {
        ByteView::new(&self.data, SciEndian::Little)
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.data[BITMAP_HEADER_SIZE..]
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data[BITMAP_HEADER_SIZE..]
    }
}

/// Bitmaps owned by the engine, addressed by handle.
#[derive(Default)]
pub struct BitmapStore {
    next_handle: u32,
    bitmaps: HashMap<BitmapHandle, Bitmap>,
}

impl BitmapStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, bitmap: Bitmap) -> BitmapHandle {
        self.next_handle += 1;
        let handle = BitmapHandle(self.next_handle);
        self.bitmaps.insert(handle, bitmap);
        handle
    }

    #[must_use]
    pub fn get(&self, handle: BitmapHandle) -> Option<&Bitmap> {
        self.bitmaps.get(&handle)
    }

    pub fn get_mut(&mut self, handle: BitmapHandle) -> Option<&mut Bitmap> {
        self.bitmaps.get_mut(&handle)
    }

    pub fn free(&mut self, handle: BitmapHandle) -> Option<Bitmap> {
        self.bitmaps.remove(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_round_trips_fields() {
        let bitmap = Bitmap::new(4, 3, 255, Point::new(2, -1), 640, 480, true);

        assert_eq!(bitmap.width(), 4);
        assert_eq!(bitmap.height(), 3);
        assert_eq!(bitmap.origin(), Point::new(2, -1));
        assert_eq!(bitmap.skip_color(), 255);
        assert!(bitmap.remap());
        assert_eq!(bitmap.x_resolution(), 640);
        assert_eq!(bitmap.y_resolution(), 480);
        assert_eq!(bitmap.pixels(), &[255; 12]);
        assert_eq!(bitmap.view().offset_at(24).unwrap(), BITMAP_HEADER_SIZE);
    }

    #[test]
    fn set_remap_keeps_other_flags() {
        let mut bitmap = Bitmap::new(1, 1, 0, Point::default(), 320, 200, false);
        assert!(!bitmap.remap());
        bitmap.set_remap(true);
        assert!(bitmap.remap());
        bitmap.set_remap(false);
        assert!(!bitmap.remap());
    }

    #[test]
    fn store() {
        let mut store = BitmapStore::new();
        let a = store.allocate(Bitmap::new(1, 1, 0, Point::default(), 320, 200, false));
        let b = store.allocate(Bitmap::new(2, 2, 0, Point::default(), 320, 200, false));
        assert_ne!(a, b);

        store.get_mut(b).unwrap().pixels_mut()[0] = 5;
        assert_eq!(store.get(b).unwrap().pixels()[0], 5);

        assert!(store.free(a).is_some());
        assert!(store.get(a).is_none());
    }
}
