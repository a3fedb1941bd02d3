use crate::ratio::Ratio;
use crate::rect::{Point, Rect};
use crate::render::reader::Reader;
use crate::render::table::ScaleTable;

/// Turns target coordinates into source pixels.
pub trait Scaler {
    /// Positions the scaler on target pixel (`x`, `y`).
    fn set_target(&mut self, x: i32, y: i32);

    /// The source pixel under the current target position; moves one pixel right.
    fn read(&mut self) -> u8;
}

/// One source pixel per target pixel. With `FLIP` the row is walked backwards
/// from its last pixel.
pub struct NoScale<R, const FLIP: bool> {
    reader: R,
    source: Point,
    last_index: isize,
    row: usize,
    cursor: isize,
}

impl<R: Reader, const FLIP: bool> NoScale<R, FLIP> {
    /// `scaled_position` is where the cel's top left pixel lands in the target.
    #[allow(clippy::cast_possible_wrap)]
    pub fn new(reader: R, width: usize, scaled_position: Point) -> Self {
        Self {
            reader,
            source: scaled_position,
            last_index: width as isize - 1,
            row: 0,
            cursor: 0,
        }
    }

    const fn edge(&self) -> isize {
        if FLIP { -1 } else { self.last_index + 1 }
    }
}

impl<R: Reader, const FLIP: bool> Scaler for NoScale<R, FLIP> {
    #[allow(clippy::cast_sign_loss)]
    fn set_target(&mut self, x: i32, y: i32) {
        self.row = (y - self.source.y) as usize;
        let offset = (x - self.source.x) as isize;
        self.cursor = if FLIP {
            self.last_index - offset
        } else {
            offset
        };
    }

    #[allow(clippy::cast_sign_loss)]
    fn read(&mut self) -> u8 {
        assert!(self.cursor != self.edge(), "read past the edge of a cel row");
        let pixel = self.reader.row(self.row)[self.cursor as usize];
        if FLIP {
            self.cursor -= 1;
        } else {
            self.cursor += 1;
        }
        pixel
    }
}

/// Scaled reads through per-draw coordinate lookups derived from a shared
/// [`ScaleTable`].
pub struct Scale<R, const FLIP: bool> {
    reader: R,
    left: i32,
    top: i32,
    values_x: Vec<usize>,
    values_y: Vec<usize>,
    row: usize,
    x: usize,
}

/// Geometry of one scaled draw.
#[derive(Debug, Clone, Copy)]
pub struct ScaledDraw {
    pub width: usize,
    pub height: usize,
    pub target: Rect,
    pub scaled_position: Point,
    pub scale_x: Ratio,
    pub scale_y: Ratio,
    /// Low-resolution scripts index the shared table by absolute target coordinate,
    /// so every object scaled by the same ratio steps with the same cadence.
    pub global: bool,
}

/// Source index for a lookup, pinned to the cel. The tables are shared across
/// draws and the unscaled position is truncated, so the last target pixels of a
/// scaled rect can step one source pixel past the cel edge; those repeat the
/// edge pixel.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
fn clamp_index(value: i32, len: usize) -> usize {
    value.clamp(0, len as i32 - 1) as usize
}

#[allow(clippy::cast_sign_loss)]
fn lookup(table: &[i32], index: i32) -> i32 {
    let last = table.len() - 1;
    table[(index.max(0) as usize).min(last)]
}

impl<R: Reader, const FLIP: bool> Scale<R, FLIP> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn new(reader: R, draw: &ScaledDraw, table: &ScaleTable) -> Self {
        let target = draw.target;
        let width = draw.width as i32;

        let (values_x, values_y): (Vec<usize>, Vec<usize>) = if draw.global {
            let unscaled_x = (draw.scaled_position.x / draw.scale_x).to_int();
            let unscaled_y = (draw.scaled_position.y / draw.scale_y).to_int();
            (
                (target.left..target.right)
                    .map(|x| lookup(&table.values_x, x) - unscaled_x)
                    .map(|x| flip::<FLIP>(x, width))
                    .map(|x| clamp_index(x, draw.width))
                    .collect(),
                (target.top..target.bottom)
                    .map(|y| lookup(&table.values_y, y) - unscaled_y)
                    .map(|y| clamp_index(y, draw.height))
                    .collect(),
            )
        } else {
            let position = draw.scaled_position;
            (
                (target.left..target.right)
                    .map(|x| lookup(&table.values_x, x - position.x))
                    .map(|x| flip::<FLIP>(x, width))
                    .map(|x| clamp_index(x, draw.width))
                    .collect(),
                (target.top..target.bottom)
                    .map(|y| lookup(&table.values_y, y - position.y))
                    .map(|y| clamp_index(y, draw.height))
                    .collect(),
            )
        };

        Self {
            reader,
            left: target.left,
            top: target.top,
            values_x,
            values_y,
            row: 0,
            x: 0,
        }
    }
}

const fn flip<const FLIP: bool>(index: i32, width: i32) -> i32 {
    if FLIP { width - 1 - index } else { index }
}

impl<R: Reader, const FLIP: bool> Scaler for Scale<R, FLIP> {
    #[allow(clippy::cast_sign_loss)]
    fn set_target(&mut self, x: i32, y: i32) {
        self.row = self.values_y[(y - self.top) as usize];
        self.x = (x - self.left) as usize;
    }

    fn read(&mut self) -> u8 {
        assert!(self.x < self.values_x.len(), "read past the edge of the target rect");
        let pixel = self.reader.row(self.row)[self.values_x[self.x]];
        self.x += 1;
        pixel
    }
}
