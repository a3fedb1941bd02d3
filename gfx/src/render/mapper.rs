use crate::remap::{Remap, RemapRange};

/// Decides whether and how one source pixel lands on a target pixel.
pub trait Mapper {
    fn draw(&self, target: &mut u8, pixel: u8, skip_color: u8);
}

/// Opaque cels: every pixel is written.
pub struct NoMdNoSkip;

impl Mapper for NoMdNoSkip {
    #[inline]
    fn draw(&self, target: &mut u8, pixel: u8, _skip_color: u8) {
        *target = pixel;
    }
}

/// Transparent cels without remapping.
pub struct NoMd;

impl Mapper for NoMd {
    #[inline]
    fn draw(&self, target: &mut u8, pixel: u8, skip_color: u8) {
        if pixel != skip_color {
            *target = pixel;
        }
    }
}

/// Remapping cels while no remap is active. Remap colours are still never drawn
/// as themselves.
pub struct NoMap {
    range: RemapRange,
}

impl NoMap {
    #[must_use]
    pub const fn new(range: RemapRange) -> Self {
        Self { range }
    }
}

impl Mapper for NoMap {
    #[inline]
    fn draw(&self, target: &mut u8, pixel: u8, skip_color: u8) {
        if pixel != skip_color && !self.range.contains(pixel) {
            *target = pixel;
        }
    }
}

/// Remapping cels: remap colours translate the pixel already in the target.
pub struct Map<'a> {
    remap: &'a dyn Remap,
    range: RemapRange,
}

impl<'a> Map<'a> {
    pub fn new(remap: &'a dyn Remap) -> Self {
        Self {
            range: remap.range(),
            remap,
        }
    }
}

impl Mapper for Map<'_> {
    #[inline]
    fn draw(&self, target: &mut u8, pixel: u8, skip_color: u8) {
        if pixel == skip_color {
            return;
        }
        if self.range.contains(pixel) {
            *target = self.remap.remap_color(pixel, *target);
        } else {
            *target = pixel;
        }
    }
}
