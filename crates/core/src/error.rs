//! Error types for the backdrop core.

use thiserror::Error;

/// Errors produced by engine construction, configuration and scene lookup.
///
/// Rendering itself never fails: numeric edge cases degrade visually instead
/// of surfacing here.
#[derive(Debug, Error)]
pub enum BackdropError {
    /// Columns or rows were zero, or `cols * rows` overflowed.
    #[error("invalid dimensions: cols and rows must be non-zero")]
    InvalidDimensions,

    /// A scene name was not found in the registry.
    #[error("unknown scene: {0}")]
    UnknownScene(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// The 2D drawing context could not be acquired.
    #[error("drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// A configuration document could not be parsed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Writing a snapshot or reading a config file failed.
    #[error("i/o error: {0}")]
    Io(String),
}
