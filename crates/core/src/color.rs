//! Straight-alpha RGBA color used for strokes, fills and gradient stops.
//!
//! Components are f64 in [0, 1]. Serializes as a hex string (`"#rrggbb"` or
//! `"#rrggbbaa"`) the same way palette colors are written in configs; the
//! round-trip has 8-bit quantization.

use crate::error::BackdropError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An sRGB color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a color from components in [0, 1].
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// White at the given alpha, the ink every built-in scene draws with.
    pub fn white(alpha: f64) -> Self {
        Self::WHITE.with_alpha(alpha)
    }

    /// Returns the same color with alpha replaced (clamped to [0, 1]).
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Component-wise linear interpolation, `t` clamped to [0, 1].
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// RGB quantized to bytes.
    pub fn to_rgb8(self) -> [u8; 3] {
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    /// CSS `rgba()` string for 2D canvas style properties.
    pub fn to_css(self) -> String {
        let [r, g, b] = self.to_rgb8();
        let a = self.a.clamp(0.0, 1.0);
        format!("rgba({r},{g},{b},{a})")
    }

    /// Parses `"#rgb"`, `"#rrggbb"` or `"#rrggbbaa"` (the `#` is optional).
    ///
    /// Returns `BackdropError::InvalidColor` for anything else.
    pub fn from_hex(hex: &str) -> Result<Rgba, BackdropError> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return Err(BackdropError::InvalidColor(format!("non-ascii color: {hex}")));
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_owned(),
            n => {
                return Err(BackdropError::InvalidColor(format!(
                    "expected 3, 6 or 8 hex digits, got {n}"
                )))
            }
        };
        let byte = |i: usize, name: &str| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|e| BackdropError::InvalidColor(format!("invalid {name} component: {e}")))
        };
        let a = if expanded.len() == 8 { byte(6, "alpha")? } else { 1.0 };
        Ok(Rgba::new(byte(0, "red")?, byte(2, "green")?, byte(4, "blue")?, a))
    }

    /// Hex string; the alpha byte is omitted when the color is opaque.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        let a = quantize(self.a);
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

fn quantize(c: f64) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
