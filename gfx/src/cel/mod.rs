//! Cel objects: the drawable form of view frames, picture layers, in-memory bitmaps
//! and flat colour fills.
//!
//! A [`CelObj`] is metadata plus a handle on the bytes its pixels live in. Pixels
//! are never decoded up front: the row readers in [`crate::render`] decode them
//! while drawing. Cloning a cel copies the metadata and shares the resource bytes.

pub mod cache;
mod draw;
pub mod pic;
pub mod view;

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitmap::{BitmapHandle, BitmapStore};
use crate::config::{LOW_RES_X, LOW_RES_Y};
use crate::error::CelError;
use crate::rect::{Point, Rect};
use crate::remap::RemapRange;
use crate::render::reader::{Compressed, PixelSource, Reader, Uncompressed};
use crate::resource::{ByteView, ResourceData};

pub use draw::{DrawPath, MapperKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CelType {
    View,
    Pic,
    Mem,
    Color,
}

impl Display for CelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::View => "view",
            Self::Pic => "pic",
            Self::Mem => "mem",
            Self::Color => "color",
        };
        write!(f, "{name}")
    }
}

/// Identity of a cel.
///
/// Two infos are equal when type, resource, loop, cel and bitmap match; `color` is
/// not part of the identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CelInfo {
    pub kind: CelType,
    pub resource_id: u16,
    pub loop_no: i16,
    pub cel_no: i16,
    pub bitmap: BitmapHandle,
    pub color: u8,
}

impl PartialEq for CelInfo {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.resource_id == other.resource_id
            && self.loop_no == other.loop_no
            && self.cel_no == other.cel_no
            && self.bitmap == other.bitmap
    }
}

impl Eq for CelInfo {}

impl CelInfo {
    const fn blank(kind: CelType) -> Self {
        Self {
            kind,
            resource_id: 0,
            loop_no: 0,
            cel_no: 0,
            bitmap: BitmapHandle(0),
            color: 0,
        }
    }

    #[must_use]
    pub const fn view(resource_id: u16, loop_no: i16, cel_no: i16) -> Self {
        Self {
            resource_id,
            loop_no,
            cel_no,
            ..Self::blank(CelType::View)
        }
    }

    #[must_use]
    pub const fn pic(resource_id: u16, cel_no: i16) -> Self {
        Self {
            resource_id,
            cel_no,
            ..Self::blank(CelType::Pic)
        }
    }

    #[must_use]
    pub const fn mem(bitmap: BitmapHandle) -> Self {
        Self {
            bitmap,
            ..Self::blank(CelType::Mem)
        }
    }

    #[must_use]
    pub const fn color(color: u8) -> Self {
        Self {
            color,
            ..Self::blank(CelType::Color)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    None,
    Rle,
}

impl Compression {
    const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::None),
            1 => Some(Self::Rle),
            _ => None,
        }
    }
}

/// Per-type data and pixel source of a cel.
#[derive(Debug, Clone)]
pub enum CelKind {
    View {
        data: ResourceData,
    },
    Pic {
        data: ResourceData,
        priority: i16,
        relative_position: Point,
        cel_count: u8,
    },
    /// Pixels live in the bitmap named by `CelInfo::bitmap`.
    Mem,
    /// No pixels: a flat fill of `CelInfo::color`.
    Color,
}

#[derive(Debug, Clone)]
pub struct CelObj {
    pub info: CelInfo,
    pub width: u16,
    pub height: u16,
    pub origin: Point,
    /// Coordinate system the cel was authored in.
    pub x_resolution: u16,
    pub y_resolution: u16,
    pub skip_color: u8,
    pub compression: Compression,
    pub transparent: bool,
    pub remap: bool,
    /// Set when the resource itself shows the cel mirrored.
    pub mirror_x: bool,
    pub cel_header_offset: usize,
    pub hunk_palette_offset: usize,
    pub kind: CelKind,
}

/// Maps the 0/1/2 size code of view and pic headers to a resolution.
const fn resolution_from_size_flag(flag: u16) -> (u16, u16) {
    match flag {
        1 => (640, 480),
        2 => (640, 400),
        _ => (LOW_RES_X, LOW_RES_Y),
    }
}

const fn nonzero_or(value: u16, fallback: u16) -> u16 {
    if value == 0 { fallback } else { value }
}

impl CelObj {
    /// A flat fill. Colour cels are never cached.
    #[must_use]
    pub const fn color(color: u8, width: u16, height: u16, x_resolution: u16, y_resolution: u16) -> Self {
        Self {
            info: CelInfo::color(color),
            width,
            height,
            origin: Point::new(0, 0),
            x_resolution,
            y_resolution,
            skip_color: 0,
            compression: Compression::None,
            transparent: false,
            remap: false,
            mirror_x: false,
            cel_header_offset: 0,
            hunk_palette_offset: 0,
            kind: CelKind::Color,
        }
    }

    /// A cel over the in-memory bitmap `handle`. Bitmap cels are never cached.
    ///
    /// # Errors
    ///
    /// Fails with [`CelError::BitmapNotFound`] for an unknown handle.
    pub fn mem(bitmaps: &BitmapStore, handle: BitmapHandle) -> Result<Self, CelError> {
        let bitmap = bitmaps
            .get(handle)
            .ok_or(CelError::BitmapNotFound(handle))?;

        Ok(Self {
            info: CelInfo::mem(handle),
            width: bitmap.width(),
            height: bitmap.height(),
            origin: bitmap.origin(),
            x_resolution: nonzero_or(bitmap.x_resolution(), LOW_RES_X),
            y_resolution: nonzero_or(bitmap.y_resolution(), LOW_RES_Y),
            skip_color: bitmap.skip_color(),
            compression: Compression::None,
            transparent: true,
            remap: bitmap.remap(),
            mirror_x: false,
            cel_header_offset: 0,
            hunk_palette_offset: bitmap.view().offset_at(20)?,
            kind: CelKind::Mem,
        })
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_size(i32::from(self.width), i32::from(self.height))
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Drawing priority of a pic cel.
    #[must_use]
    pub const fn priority(&self) -> i16 {
        match self.kind {
            CelKind::Pic { priority, .. } => priority,
            _ => 0,
        }
    }

    /// Position of a pic cel relative to the picture's origin.
    #[must_use]
    pub const fn relative_position(&self) -> Point {
        match self.kind {
            CelKind::Pic {
                relative_position, ..
            } => relative_position,
            _ => Point::new(0, 0),
        }
    }

    /// Number of cels in the picture a pic cel belongs to.
    #[must_use]
    pub const fn cel_count(&self) -> u8 {
        match self.kind {
            CelKind::Pic { cel_count, .. } => cel_count,
            _ => 1,
        }
    }

    /// Where this cel's pixels are read from.
    ///
    /// # Errors
    ///
    /// Colour cels have no pixels; bitmap cels fail when the bitmap is gone.
    pub fn source<'a>(&'a self, bitmaps: &'a BitmapStore) -> Result<PixelSource<'a>, CelError> {
        let data = match &self.kind {
            CelKind::View { data } | CelKind::Pic { data, .. } => data.view(),
            CelKind::Mem => bitmaps
                .get(self.info.bitmap)
                .ok_or(CelError::BitmapNotFound(self.info.bitmap))?
                .view(),
            CelKind::Color => {
                return Err(CelError::UnsupportedOperation("pixel access on a color cel"));
            }
        };

        Ok(PixelSource {
            data,
            header_offset: self.cel_header_offset,
            width: usize::from(self.width),
            height: usize::from(self.height),
            skip_color: self.skip_color,
        })
    }

    /// The pixel at (`x`, `y`), as seen with the given mirroring. Only the part of
    /// the row up to the pixel is decoded.
    ///
    /// # Errors
    ///
    /// Fails for colour cels, for coordinates outside the cel and on bad pixel data.
    pub fn read_pixel(
        &self,
        bitmaps: &BitmapStore,
        x: u16,
        y: u16,
        mirror_x: bool,
    ) -> Result<u8, CelError> {
        if x >= self.width || y >= self.height {
            return Err(CelError::PixelOutOfBounds { x, y });
        }

        let source = self.source(bitmaps)?;
        let column = usize::from(if mirror_x { self.width - x - 1 } else { x });
        let row = usize::from(y);

        Ok(match self.compression {
            Compression::None => Uncompressed::new(&source)?.row(row)[column],
            Compression::Rle => Compressed::new(&source, column + 1)?.row(row)[column],
        })
    }

    /// The palette embedded in the cel's resource, for the palette manager.
    ///
    /// # Errors
    ///
    /// Fails when the palette offset points outside the resource.
    pub fn hunk_palette<'a>(
        &'a self,
        bitmaps: &'a BitmapStore,
    ) -> Result<Option<&'a [u8]>, CelError> {
        if self.hunk_palette_offset == 0 || matches!(self.kind, CelKind::Color) {
            return Ok(None);
        }

        let data = self.source(bitmaps)?.data;
        let len = data.len().saturating_sub(self.hunk_palette_offset);
        if len == 0 {
            return Err(CelError::Truncated {
                what: "hunk palette",
                offset: self.hunk_palette_offset,
                len: data.len(),
            });
        }
        data.slice("hunk palette", self.hunk_palette_offset, len).map(Some)
    }

    /// Whether any pixel, other than the skip colour, matches `found`.
    fn scan_pixels(
        &self,
        source: &PixelSource<'_>,
        mut found: impl FnMut(u8) -> bool,
    ) -> Result<bool, CelError> {
        let width = source.width;
        let skip = self.skip_color;
        let mut check = |row: &[u8]| row[..width].iter().any(|&pixel| pixel != skip && found(pixel));

        match self.compression {
            Compression::None => {
                let mut reader = Uncompressed::new(source)?;
                Ok((0..source.height).any(|y| check(reader.row(y))))
            }
            Compression::Rle => {
                let mut reader = Compressed::new(source, width)?;
                Ok((0..source.height).any(|y| check(reader.row(y))))
            }
        }
    }

    /// Whether the cel uses any remap colour.
    fn uses_remap_colors(&self, source: &PixelSource<'_>, range: RemapRange) -> Result<bool, CelError> {
        self.scan_pixels(source, |pixel| range.contains(pixel))
    }

    /// Whether an uncompressed cel shows its skip colour anywhere.
    fn has_skip_pixels(&self, source: &PixelSource<'_>) -> Result<bool, CelError> {
        let pixels = Uncompressed::new(source)?;
        Ok(pixels.all_pixels().contains(&self.skip_color))
    }
}

/// Cel header fields shared by views and pics.
struct CelHeader {
    width: u16,
    height: u16,
    displace_x: i16,
    displace_y: i16,
    skip_color: u8,
    compression: u8,
    /// Transparent and remap bits, when the header carries them.
    flags: Option<(bool, bool)>,
}

impl CelHeader {
    const FLAGS_PRESENT: u8 = 0x80;

    fn read(data: &ByteView<'_>, offset: usize) -> Result<Self, CelError> {
        let flags = if data.u8_at(offset + 10)? & Self::FLAGS_PRESENT == 0 {
            None
        } else {
            let flags = data.u16_at(offset + 10)?;
            Some((flags & 1 != 0, flags & 2 != 0))
        };

        Ok(Self {
            width: data.u16_at(offset)?,
            height: data.u16_at(offset + 2)?,
            displace_x: data.i16_at(offset + 4)?,
            displace_y: data.i16_at(offset + 6)?,
            skip_color: data.u8_at(offset + 8)?,
            compression: data.u8_at(offset + 9)?,
            flags,
        })
    }
}
