//! Conversions from premultiplied linear-alpha pixels to RGBA8 buffers.
//!
//! Always available (no feature gate) so the `png` snapshot path and any
//! in-memory consumer share the same conversion.

use backdrop_core::Rgba;

/// One premultiplied pixel: `[r*a, g*a, b*a, a]`, each in [0, 1].
pub type Premul = [f32; 4];

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Premultiplies a straight-alpha color, scaling its alpha by `coverage`.
pub fn premultiply(color: Rgba, coverage: f32) -> Premul {
    let a = (color.a as f32 * coverage).clamp(0.0, 1.0);
    [color.r as f32 * a, color.g as f32 * a, color.b as f32 * a, a]
}

/// Source-over compositing of `src` onto `dst`, both premultiplied.
pub fn source_over(dst: &mut Premul, src: Premul) {
    let inv = 1.0 - src[3];
    for (d, s) in dst.iter_mut().zip(src) {
        *d = s + *d * inv;
    }
}

/// Straight-alpha color of a premultiplied pixel.
pub fn unpremultiply(px: Premul) -> Rgba {
    let a = px[3];
    if a <= 0.0 {
        return Rgba::TRANSPARENT;
    }
    Rgba::new(
        f64::from(px[0] / a),
        f64::from(px[1] / a),
        f64::from(px[2] / a),
        f64::from(a),
    )
}

/// Straight-alpha RGBA8 bytes, four per pixel.
pub fn to_rgba8(pixels: &[Premul]) -> Vec<u8> {
    pixels
        .iter()
        .flat_map(|&px| {
            let c = unpremultiply(px);
            [
                to_byte(c.r as f32),
                to_byte(c.g as f32),
                to_byte(c.b as f32),
                to_byte(c.a as f32),
            ]
        })
        .collect()
}

/// Opaque RGBA8 bytes of `pixels` flattened over `background`.
///
/// `background` is treated as opaque; its alpha is ignored.
pub fn to_rgba8_over(pixels: &[Premul], background: Rgba) -> Vec<u8> {
    let bg = premultiply(background.with_alpha(1.0), 1.0);
    pixels
        .iter()
        .flat_map(|&px| {
            let mut out = bg;
            source_over(&mut out, px);
            [to_byte(out[0]), to_byte(out[1]), to_byte(out[2]), 255u8]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_rgba8_correct_length() {
        let buf = to_rgba8(&[[0.0; 4]; 12]);
        assert_eq!(buf.len(), 12 * 4);
    }

    #[test]
    fn transparent_pixels_stay_transparent() {
        assert_eq!(to_rgba8(&[[0.0; 4]]), vec![0, 0, 0, 0]);
    }

    #[test]
    fn half_covered_white_unpremultiplies() {
        let px = premultiply(Rgba::WHITE, 0.5);
        assert_eq!(px, [0.5, 0.5, 0.5, 0.5]);
        assert_eq!(to_rgba8(&[px]), vec![255, 255, 255, 128]);
    }

    #[test]
    fn source_over_opaque_replaces() {
        let mut dst = premultiply(Rgba::WHITE, 1.0);
        source_over(&mut dst, premultiply(Rgba::BLACK, 1.0));
        assert_eq!(dst, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn flatten_over_background_is_opaque() {
        let bg = Rgba::new(0.0, 0.0, 0.0, 0.2);
        let buf = to_rgba8_over(&[premultiply(Rgba::WHITE, 0.5), [0.0; 4]], bg);
        assert_eq!(buf, vec![128, 128, 128, 255, 0, 0, 0, 255]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn compositing_keeps_channels_in_range(
                r in 0.0_f64..=1.0, g in 0.0_f64..=1.0, b in 0.0_f64..=1.0,
                a in 0.0_f64..=1.0, cov in 0.0_f32..=1.0,
            ) {
                let mut dst = premultiply(Rgba::new(0.3, 0.6, 0.9, 0.7), 1.0);
                source_over(&mut dst, premultiply(Rgba::new(r, g, b, a), cov));
                for c in dst {
                    prop_assert!((0.0..=1.0 + 1e-6).contains(&c));
                }
                prop_assert!(dst[0] <= dst[3] + 1e-6);
            }
        }
    }
}
