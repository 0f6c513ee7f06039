#![deny(unsafe_code)]
//! Headless CPU raster backend for the backdrop engine.
//!
//! [`Pixmap`] implements [`backdrop_core::Surface`] over a premultiplied
//! RGBA buffer, so any scene can be rendered without a browser. With the
//! `png` feature (default on), [`write_png`] saves a frame to disk.

pub mod pixel;
pub mod pixmap;
pub mod raster;
#[cfg(feature = "png")]
pub mod snapshot;
pub mod stroke;

pub use pixmap::Pixmap;
#[cfg(feature = "png")]
pub use snapshot::write_png;
