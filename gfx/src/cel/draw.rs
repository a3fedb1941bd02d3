//! Choosing and running the reader, scaler and mapper for one draw.

use crate::buffer::Buffer;
use crate::context::{CelContext, DrawResources};
use crate::error::CelError;
use crate::ratio::Ratio;
use crate::rect::{Point, Rect};
use crate::remap::Remap;
use crate::render::mapper::{Map, NoMap, NoMd, NoMdNoSkip};
use crate::render::reader::{Compressed, Reader, Uncompressed};
use crate::render::renderer::render;
use crate::render::scaler::{NoScale, Scale, ScaledDraw, Scaler};
use crate::render::table::CelScaler;
use crate::screen_item::ScreenItem;

use super::{CelKind, CelObj, Compression};

/// Which [`crate::render::mapper::Mapper`] a draw writes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperKind {
    /// Opaque: every pixel is written.
    NoMdNoSkip,
    NoMd,
    /// Remapping cel, no remap active.
    NoMap,
    Map,
}

/// One of the drawing paths: a mapper and the reader and scaler flavour feeding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawPath {
    pub mapper: MapperKind,
    pub compression: Compression,
    pub scaled: bool,
    pub mirrored: bool,
}

/// Parameters of one draw beyond the target.
#[derive(Debug, Clone, Copy)]
struct DrawRequest {
    rect: Rect,
    scaled_position: Point,
    mirrored: bool,
    scale_x: Ratio,
    scale_y: Ratio,
    black_lines: bool,
}

/// The mapper half of a draw, waiting for its scaler.
struct Blit<'a> {
    target: &'a mut Buffer,
    rect: Rect,
    mapper: MapperKind,
    remap: &'a dyn Remap,
    skip_color: u8,
    black_lines: bool,
}

impl Blit<'_> {
    fn run<S: Scaler>(self, scaler: &mut S) {
        let Self {
            target,
            rect,
            mapper,
            remap,
            skip_color,
            black_lines,
        } = self;

        match mapper {
            MapperKind::NoMdNoSkip => {
                render(target, &rect, scaler, &NoMdNoSkip, skip_color, black_lines);
            }
            MapperKind::NoMd => render(target, &rect, scaler, &NoMd, skip_color, black_lines),
            MapperKind::NoMap => render(
                target,
                &rect,
                scaler,
                &NoMap::new(remap.range()),
                skip_color,
                black_lines,
            ),
            MapperKind::Map => {
                render(target, &rect, scaler, &Map::new(remap), skip_color, black_lines);
            }
        }
    }
}

impl CelObj {
    /// The drawing path for this cel under the given remap state, scale and mirroring.
    #[must_use]
    pub const fn select_path(&self, remap_count: usize, scaled: bool, mirrored: bool) -> DrawPath {
        let mapper = if self.remap {
            if remap_count > 0 {
                MapperKind::Map
            } else {
                MapperKind::NoMap
            }
        } else if !scaled && !self.transparent && matches!(self.compression, Compression::None) {
            MapperKind::NoMdNoSkip
        } else {
            MapperKind::NoMd
        };

        DrawPath {
            mapper,
            compression: self.compression,
            scaled,
            mirrored,
        }
    }

    /// Draws the part of the cel that falls inside `rect` of `target`.
    ///
    /// `scaled_position` is where the cel's top left pixel lands. Ratios with a
    /// numerator of zero or less draw nothing. Colour cels fill `rect` and ignore
    /// the rest.
    ///
    /// # Errors
    ///
    /// Fails before [`CelContext::init`] and on corrupt pixel data.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        ctx: &mut CelContext,
        target: &mut Buffer,
        rect: &Rect,
        scaled_position: Point,
        mirrored: bool,
        scale_x: Ratio,
        scale_y: Ratio,
    ) -> Result<(), CelError> {
        self.draw_request(
            ctx,
            target,
            &DrawRequest {
                rect: *rect,
                scaled_position,
                mirrored,
                scale_x,
                scale_y,
                black_lines: false,
            },
        )
    }

    /// Draws the cel as placed by `item`, limited to `rect`.
    ///
    /// # Errors
    ///
    /// See [`draw`](Self::draw).
    pub fn draw_screen_item(
        &self,
        ctx: &mut CelContext,
        target: &mut Buffer,
        item: &ScreenItem,
        rect: &Rect,
        mirrored: bool,
    ) -> Result<(), CelError> {
        self.draw_request(
            ctx,
            target,
            &DrawRequest {
                rect: *rect,
                scaled_position: item.scaled_position,
                mirrored,
                scale_x: item.ratio_x,
                scale_y: item.ratio_y,
                black_lines: item.draw_black_lines,
            },
        )
    }

    fn draw_request(
        &self,
        ctx: &mut CelContext,
        target: &mut Buffer,
        request: &DrawRequest,
    ) -> Result<(), CelError> {
        if matches!(self.kind, CelKind::Color) {
            target.fill_rect(&request.rect, self.info.color);
            return Ok(());
        }

        if self.is_empty() || request.scale_x.numerator() <= 0 || request.scale_y.numerator() <= 0 {
            return Ok(());
        }

        let scaled = !(request.scale_x.is_one() && request.scale_y.is_one());
        let mut rect = request.rect.intersection(&target.rect());
        if !scaled {
            let position = request.scaled_position;
            rect.clip(&Rect::new(
                position.x,
                position.y,
                position.x + i32::from(self.width),
                position.y + i32::from(self.height),
            ));
        }
        if rect.is_empty() {
            return Ok(());
        }

        let resources = ctx.draw_resources()?;
        let path = self.select_path(resources.remap.remap_count(), scaled, request.mirrored);
        tracing::trace!("{} cel {:?}: {path:?} into {rect:?}", self.info.kind, self.info);

        self.run_path(resources, target, rect, request, path)
    }

    #[allow(clippy::cast_sign_loss)]
    fn run_path(
        &self,
        resources: DrawResources<'_>,
        target: &mut Buffer,
        rect: Rect,
        request: &DrawRequest,
        path: DrawPath,
    ) -> Result<(), CelError> {
        let source = self.source(resources.bitmaps)?;
        let blit = Blit {
            target,
            rect,
            mapper: path.mapper,
            remap: resources.remap,
            skip_color: self.skip_color,
            black_lines: request.black_lines,
        };

        match path.compression {
            Compression::None => {
                let reader = Uncompressed::new(&source)?;
                self.scale_and_blit(reader, resources.scaler, resources.global_scaling, blit, request, path);
            }
            Compression::Rle => {
                // Unmirrored unscaled draws never look right of the rectangle.
                let max_width = if path.scaled || path.mirrored {
                    source.width
                } else {
                    (rect.right - request.scaled_position.x) as usize
                };
                let reader = Compressed::new(&source, max_width)?;
                self.scale_and_blit(reader, resources.scaler, resources.global_scaling, blit, request, path);
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn scale_and_blit<R: Reader>(
        &self,
        reader: R,
        scaler: &mut CelScaler,
        global: bool,
        blit: Blit<'_>,
        request: &DrawRequest,
        path: DrawPath,
    ) {
        let width = usize::from(self.width);
        let position = request.scaled_position;

        if !path.scaled {
            if path.mirrored {
                blit.run(&mut NoScale::<_, true>::new(reader, width, position));
            } else {
                blit.run(&mut NoScale::<_, false>::new(reader, width, position));
            }
            return;
        }

        let draw = ScaledDraw {
            width,
            height: usize::from(self.height),
            target: blit.rect,
            scaled_position: position,
            scale_x: request.scale_x,
            scale_y: request.scale_y,
            global,
        };
        let table = scaler.table(request.scale_x, request.scale_y);
        if path.mirrored {
            blit.run(&mut Scale::<_, true>::new(reader, &draw, table));
        } else {
            blit.run(&mut Scale::<_, false>::new(reader, &draw, table));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::remap::ColorRemap;
    use crate::resource::{ResourceStore, ResourceType};
    use crate::testing::{CelDef, ViewBuilder};
    use pretty_assertions::assert_eq;

    const PIXELS: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    fn context(store: ResourceStore) -> CelContext {
        let mut ctx = CelContext::new(RenderConfig::default(), Box::new(store));
        ctx.init().unwrap();
        ctx
    }

    /// View 1: loop 0 uncompressed, loop 1 the same pixels compressed, loop 2 with
    /// holes, loop 3 using remap colours.
    fn views() -> ResourceStore {
        let mut store = ResourceStore::new();
        store.insert(
            ResourceType::View,
            1,
            ViewBuilder::new()
                .add_loop(vec![CelDef::uncompressed(4, 2, PIXELS.to_vec())])
                .add_loop(vec![CelDef::compressed(4, 2, PIXELS.to_vec())])
                .add_loop(vec![CelDef::uncompressed(3, 1, vec![1, 255, 3])])
                .add_loop(vec![CelDef::uncompressed(3, 1, vec![237, 2, 240])])
                .build(),
        );
        store
    }

    fn draw_at(ctx: &mut CelContext, cel: &CelObj, buffer: &mut Buffer, mirrored: bool) {
        let rect = buffer.rect();
        cel.draw(ctx, buffer, &rect, Point::new(0, 0), mirrored, Ratio::ONE, Ratio::ONE)
            .unwrap();
    }

    #[test]
    fn path_selection() {
        let mut cel = CelObj::color(0, 1, 1, 320, 200);
        cel.transparent = false;
        assert_eq!(cel.select_path(0, false, false).mapper, MapperKind::NoMdNoSkip);
        assert_eq!(cel.select_path(0, true, false).mapper, MapperKind::NoMd);

        cel.compression = Compression::Rle;
        assert_eq!(cel.select_path(0, false, true).mapper, MapperKind::NoMd);

        cel.compression = Compression::None;
        cel.transparent = true;
        assert_eq!(cel.select_path(3, false, false).mapper, MapperKind::NoMd);

        cel.remap = true;
        assert_eq!(cel.select_path(0, false, false).mapper, MapperKind::NoMap);
        assert_eq!(
            cel.select_path(2, true, true),
            DrawPath {
                mapper: MapperKind::Map,
                compression: Compression::None,
                scaled: true,
                mirrored: true
            }
        );
    }

    #[test]
    fn unscaled_draws_copy_pixels() {
        let mut ctx = context(views());
        for loop_no in [0, 1] {
            let cel = ctx.view(1, loop_no, 0).unwrap();
            let mut buffer = Buffer::new(4, 2);
            draw_at(&mut ctx, &cel, &mut buffer, false);
            assert_eq!(buffer.pixels(), &PIXELS, "loop {loop_no}");
        }
    }

    #[test]
    fn mirrored_rows_are_reversed() {
        let mut ctx = context(views());
        for loop_no in [0, 1] {
            let cel = ctx.view(1, loop_no, 0).unwrap();
            let mut plain = Buffer::new(4, 2);
            let mut mirrored = Buffer::new(4, 2);
            draw_at(&mut ctx, &cel, &mut plain, false);
            draw_at(&mut ctx, &cel, &mut mirrored, true);

            for y in 0..2 {
                let mut reversed = plain.row(y).to_vec();
                reversed.reverse();
                assert_eq!(mirrored.row(y), reversed.as_slice(), "loop {loop_no} row {y}");
            }
        }
    }

    #[test]
    fn partial_rectangles_read_from_the_right_place() {
        let mut ctx = context(views());
        for loop_no in [0, 1] {
            let cel = ctx.view(1, loop_no, 0).unwrap();
            let mut buffer = Buffer::new(6, 3);
            cel.draw(
                &mut ctx,
                &mut buffer,
                &Rect::new(2, 1, 4, 3),
                Point::new(1, 1),
                false,
                Ratio::ONE,
                Ratio::ONE,
            )
            .unwrap();

            assert_eq!(buffer.row(0), &[0; 6]);
            assert_eq!(buffer.row(1), &[0, 0, 2, 3, 0, 0], "loop {loop_no}");
            assert_eq!(buffer.row(2), &[0, 0, 6, 7, 0, 0], "loop {loop_no}");
        }
    }

    #[test]
    fn skip_colour_leaves_the_target_alone() {
        let mut ctx = context(views());
        let cel = ctx.view(1, 2, 0).unwrap();
        assert!(cel.transparent);

        let mut buffer = Buffer::filled(3, 1, 9);
        draw_at(&mut ctx, &cel, &mut buffer, false);
        assert_eq!(buffer.row(0), &[1, 9, 3]);
    }

    #[test]
    fn remap_colours() {
        let mut ctx = context(views());
        let cel = ctx.view(1, 3, 0).unwrap();
        assert!(cel.remap);

        // No active remap: remap colours are not drawn at all.
        let mut buffer = Buffer::filled(3, 1, 9);
        draw_at(&mut ctx, &cel, &mut buffer, false);
        assert_eq!(buffer.row(0), &[9, 2, 9]);

        let mut remap = ColorRemap::default();
        remap.set_remap_to_color(237, 50);
        remap.set_remap_by_range(240, 0, 100, 3);
        ctx.set_remap(Box::new(remap));

        let mut buffer = Buffer::filled(3, 1, 9);
        draw_at(&mut ctx, &cel, &mut buffer, false);
        assert_eq!(buffer.row(0), &[50, 2, 12]);
    }

    #[test]
    fn scaled_draws_repeat_pixels() {
        let mut ctx = context(views());
        let double = Ratio::new(2, 1);
        for loop_no in [0, 1] {
            let cel = ctx.view(1, loop_no, 0).unwrap();
            let mut buffer = Buffer::new(8, 4);
            let rect = buffer.rect();
            cel.draw(&mut ctx, &mut buffer, &rect, Point::new(0, 0), false, double, double)
                .unwrap();

            assert_eq!(buffer.row(0), &[1, 1, 2, 2, 3, 3, 4, 4], "loop {loop_no}");
            assert_eq!(buffer.row(1), buffer.row(0), "loop {loop_no}");
            assert_eq!(buffer.row(2), &[5, 5, 6, 6, 7, 7, 8, 8], "loop {loop_no}");
            assert_eq!(buffer.row(3), buffer.row(2), "loop {loop_no}");

            let mut mirrored = Buffer::new(8, 4);
            cel.draw(&mut ctx, &mut mirrored, &rect, Point::new(0, 0), true, double, double)
                .unwrap();
            assert_eq!(mirrored.row(0), &[4, 4, 3, 3, 2, 2, 1, 1], "loop {loop_no}");
            assert_eq!(mirrored.row(3), &[8, 8, 7, 7, 6, 6, 5, 5], "loop {loop_no}");
        }
    }

    #[test]
    fn scaled_compressed_draws_match_uncompressed() {
        let mut ctx = context(views());
        let plain = ctx.view(1, 0, 0).unwrap();
        let compressed = ctx.view(1, 1, 0).unwrap();
        assert_eq!(compressed.compression, Compression::Rle);

        let half = Ratio::new(1, 2);
        for mirrored in [false, true] {
            let mut expected = Buffer::filled(2, 1, 9);
            let mut actual = Buffer::filled(2, 1, 9);
            let rect = expected.rect();
            plain
                .draw(&mut ctx, &mut expected, &rect, Point::new(0, 0), mirrored, half, half)
                .unwrap();
            compressed
                .draw(&mut ctx, &mut actual, &rect, Point::new(0, 0), mirrored, half, half)
                .unwrap();

            let row: &[u8] = if mirrored { &[4, 2] } else { &[1, 3] };
            assert_eq!(expected.row(0), row);
            assert_eq!(actual.pixels(), expected.pixels(), "mirrored {mirrored}");
        }
    }

    #[test]
    fn zero_ratio_draws_nothing() {
        let mut ctx = context(views());
        let cel = ctx.view(1, 0, 0).unwrap();
        let mut buffer = Buffer::new(4, 2);
        let rect = buffer.rect();
        cel.draw(&mut ctx, &mut buffer, &rect, Point::new(0, 0), false, Ratio::new(0, 1), Ratio::ONE)
            .unwrap();
        assert_eq!(buffer.pixels(), &[0; 8]);
    }

    #[test]
    fn drawing_needs_an_initialised_context() {
        let mut ctx = context(views());
        let cel = ctx.view(1, 0, 0).unwrap();
        ctx.teardown();

        let mut buffer = Buffer::new(4, 2);
        let rect = buffer.rect();
        assert_eq!(
            cel.draw(&mut ctx, &mut buffer, &rect, Point::new(0, 0), false, Ratio::ONE, Ratio::ONE),
            Err(CelError::NotInitialized)
        );
    }

    #[test]
    fn color_cel_fills_its_rectangle() {
        let mut ctx = context(ResourceStore::new());
        let cel = ctx.color(7, 10, 10);
        let mut buffer = Buffer::new(20, 20);
        cel.draw(
            &mut ctx,
            &mut buffer,
            &Rect::new(5, 5, 15, 15),
            Point::new(5, 5),
            false,
            Ratio::ONE,
            Ratio::ONE,
        )
        .unwrap();

        for y in 0..20 {
            for x in 0..20 {
                let inside = (5..15).contains(&x) && (5..15).contains(&y);
                assert_eq!(buffer[(x, y)], if inside { 7 } else { 0 }, "({x}, {y})");
            }
        }
    }
}
