use std::env;
use std::error::Error;

use gfx::bitmap::Bitmap;
use gfx::buffer::Buffer;
use gfx::cel::CelInfo;
use gfx::config::RenderConfig;
use gfx::context::CelContext;
use gfx::plane::{Plane, PlaneList};
use gfx::rect::{Point, Rect};
use gfx::remap::ColorRemap;
use gfx::resource::{ResourceStore, ResourceType};
use gfx::screen_item::{ScaleInfo, ScreenItem};
use gfx::testing::{CelDef, PicBuilder, ViewBuilder};
use tracing_subscriber::EnvFilter;

const SCENE_WIDTH: u16 = 24;
const SCENE_HEIGHT: u16 = 12;

const PIC: u16 = 10;
const VIEW: u16 = 20;
const SHADOW: u8 = 240;

fn main() {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .init();

    println!("sci32gfx v{}", env!("CARGO_PKG_VERSION"));
    let mirror = env::args().skip(1).any(|arg| arg == "--mirror");

    let frame = match draw_scene(mirror) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::error!("{err}");
            drop(guard);
            std::process::exit(1);
        }
    };

    for y in 0..frame.height() {
        let row: Vec<_> = frame.row(y).iter().map(|pixel| format!("{pixel:02x}")).collect();
        println!("{}", row.join(" "));
    }
}

/// View and pic resources of the demo scene.
fn resources() -> ResourceStore {
    let width = usize::from(SCENE_WIDTH);
    let height = usize::from(SCENE_HEIGHT);
    let background: Vec<u8> = (0..width * height)
        .map(|i| 16 + u8::try_from((i % width + i / width) % 4).unwrap_or(0))
        .collect();

    let mut store = ResourceStore::new();
    store.insert(
        ResourceType::Pic,
        PIC,
        PicBuilder::new()
            .add_cel(CelDef::uncompressed(SCENE_WIDTH, SCENE_HEIGHT, background))
            .add_cel(CelDef::compressed(5, 2, vec![32; 10]).placement(5, 2, 8))
            .build(),
    );

    let s = 255;
    let actor = vec![
        s, 48, 48, s, //
        48, 49, 49, 48, //
        s, 50, 50, 50, //
        SHADOW, SHADOW, SHADOW, SHADOW, //
    ];
    store.insert(
        ResourceType::View,
        VIEW,
        ViewBuilder::new()
            .add_loop(vec![CelDef::compressed(4, 4, actor)])
            .add_mirrored_loop(0)
            .build(),
    );
    store
}

fn draw_scene(mirror: bool) -> Result<Buffer, Box<dyn Error>> {
    let config = RenderConfig::default();
    let mut remap = ColorRemap::default();
    remap.set_remap_to_color(SHADOW, 0);

    let mut ctx = CelContext::new(config.clone(), Box::new(resources())).with_remap(Box::new(remap));
    ctx.init()?;

    let mut marker = Bitmap::new(3, 2, 255, Point::new(0, 0), 0, 0, false);
    marker.pixels_mut().copy_from_slice(&[64, 255, 64, 255, 64, 255]);
    let marker = ctx.bitmaps_mut().allocate(marker);

    let scene = Rect::from_size(i32::from(SCENE_WIDTH), i32::from(SCENE_HEIGHT));
    let mut plane = Plane::new(1, scene, &config);
    plane.back_color = Some(0);
    plane.add_pic(&mut ctx, PIC, None, mirror)?;

    let id = plane.next_creation_id();
    plane.add_screen_item(ScreenItem::with_position(
        id,
        CelInfo::view(VIEW, i16::from(mirror), 0),
        Point::new(6, 7),
        ScaleInfo::default(),
    ));

    let id = plane.next_creation_id();
    plane.add_screen_item(ScreenItem::with_position(
        id,
        CelInfo::view(VIEW, 0, 0),
        Point::new(16, 11),
        ScaleInfo::manual(256, 256),
    ));

    let id = plane.next_creation_id();
    let mut item = ScreenItem::with_position(id, CelInfo::mem(marker), Point::new(20, 1), ScaleInfo::default());
    item.priority = 100;
    item.fixed_priority = true;
    plane.add_screen_item(item);

    let id = plane.next_creation_id();
    let mut item = ScreenItem::with_rect(id, CelInfo::color(96), Rect::new(0, 0, 3, 1));
    item.priority = 100;
    item.fixed_priority = true;
    plane.add_screen_item(item);

    let mut planes = PlaneList::new();
    planes.add(plane);

    let mut frame = Buffer::new(usize::from(SCENE_WIDTH), usize::from(SCENE_HEIGHT));
    planes.draw(&mut ctx, &mut frame)?;

    tracing::info!(
        "composited {} cels into a {}x{} frame",
        ctx.cache()?.len(),
        frame.width(),
        frame.height()
    );
    ctx.teardown();
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scene_layers_fill_and_bitmap_over_picture() {
        let frame = draw_scene(false).unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(frame.width(), usize::from(SCENE_WIDTH));
        assert_eq!(&frame.row(0)[..4], &[96, 96, 96, 19]);
        assert_eq!(&frame.row(1)[20..23], &[64, 18, 64]);
        assert_eq!(&frame.row(2)[20..23], &[18, 64, 16]);
    }
}
