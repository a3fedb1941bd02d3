use crate::buffer::Buffer;
use crate::rect::Rect;
use crate::render::mapper::Mapper;
use crate::render::scaler::Scaler;

/// Composites `rect` of `target`, pulling source pixels from `scaler` and writing
/// them through `mapper`.
///
/// With `black_lines` every even row of the target buffer inside `rect` is
/// cleared to colour 0 instead of drawn.
///
/// `rect` must lie inside `target`.
#[allow(clippy::cast_sign_loss)]
pub fn render<S: Scaler, M: Mapper>(
    target: &mut Buffer,
    rect: &Rect,
    scaler: &mut S,
    mapper: &M,
    skip_color: u8,
    black_lines: bool,
) {
    if rect.is_empty() {
        return;
    }
    assert!(
        target.rect().intersection(rect) == *rect,
        "render rectangle {rect:?} is outside the target"
    );

    let stride = target.width();
    let width = rect.width() as usize;
    let skip_stride = stride - width;
    let pixels = target.pixels_mut();

    let mut index = rect.top as usize * stride + rect.left as usize;
    for y in rect.top..rect.bottom {
        let row = &mut pixels[index..index + width];
        if black_lines && y % 2 == 0 {
            row.fill(0);
        } else {
            scaler.set_target(rect.left, y);
            for pixel in row {
                mapper.draw(pixel, scaler.read(), skip_color);
            }
        }
        index += width + skip_stride;
    }
}
