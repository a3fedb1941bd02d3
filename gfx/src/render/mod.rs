//! The per-pixel compositing pipeline.
//!
//! A draw is assembled from three independent pieces: a [`reader::Reader`] that
//! decodes source rows, a [`scaler::Scaler`] that maps target coordinates to source
//! pixels and a [`mapper::Mapper`] that decides what to write. The
//! [`renderer::render`] loop drives them over the destination rectangle.
pub mod mapper;
pub mod reader;
pub mod renderer;
pub mod scaler;
pub mod table;
