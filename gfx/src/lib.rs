//! Cel compositing for SCI32-era games: cels parsed from view and pic resources,
//! in-memory bitmaps and colour fills, drawn into indexed-colour buffers with
//! scaling, mirroring, transparency and palette remapping.

pub mod bitmap;
pub mod buffer;

#[allow(clippy::missing_panics_doc)]
pub mod cel;
pub mod config;
pub mod context;
pub mod error;
pub mod plane;

#[allow(clippy::cast_possible_truncation)]
pub mod ratio;
pub mod rect;
pub mod remap;

#[allow(clippy::missing_panics_doc)]
pub mod render;
pub mod resource;

#[allow(clippy::similar_names)]
pub mod screen_item;
pub mod screen_item_list;

#[allow(clippy::missing_panics_doc)]
pub mod testing;
