//! PNG snapshots of a [`Pixmap`].
//!
//! Feature-gated behind `png` (default on) so the raster surface itself does
//! not pull in the `image` crate. The byte conversion lives in
//! [`crate::pixel`] (always available).

use std::path::Path;

use backdrop_core::{BackdropError, Rgba};

use crate::pixmap::Pixmap;

/// Writes `pixmap` flattened over `background` as an opaque PNG.
///
/// Returns `BackdropError::InvalidDimensions` for an empty pixmap, or
/// `BackdropError::Io` on write failure.
pub fn write_png(pixmap: &Pixmap, background: Rgba, path: &Path) -> Result<(), BackdropError> {
    if pixmap.width() == 0 || pixmap.height() == 0 {
        return Err(BackdropError::InvalidDimensions);
    }
    let rgba = pixmap.to_rgba8_over(background);
    let img = image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba)
        .ok_or_else(|| BackdropError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| BackdropError::Io(e.to_string()))?;
    tracing::debug!(path = %path.display(), width = pixmap.width(), height = pixmap.height(), "wrote png");
    Ok(())
}
