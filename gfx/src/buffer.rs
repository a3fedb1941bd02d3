use crate::rect::Rect;

/// An indexed-colour pixel surface. Rows are stored top to bottom, `width` bytes
/// each, with no padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Buffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Buffer {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    #[must_use]
    pub fn filled(width: usize, height: usize, color: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// The whole surface as a rectangle.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn rect(&self) -> Rect {
        Rect::from_size(self.width as i32, self.height as i32)
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    #[must_use]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: u8) {
        self[(x, y)] = color;
    }

    /// Fills the part of `rect` that lies on the surface.
    #[allow(clippy::cast_sign_loss)]
    pub fn fill_rect(&mut self, rect: &Rect, color: u8) {
        let rect = rect.intersection(&self.rect());
        if rect.is_empty() {
            return;
        }

        for y in rect.top..rect.bottom {
            let start = y as usize * self.width + rect.left as usize;
            self.pixels[start..start + rect.width() as usize].fill(color);
        }
    }
}

impl std::ops::Index<(usize, usize)> for Buffer {
    type Output = u8;

    fn index(&self, (x, y): (usize, usize)) -> &u8 {
        assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }
}

impl std::ops::IndexMut<(usize, usize)> for Buffer {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        assert!(x < self.width && y < self.height);
        &mut self.pixels[y * self.width + x]
    }
}
