//! Lenient extraction of scene parameters from a `serde_json::Value` object.
//!
//! Each helper takes the params object, a key and a default. A missing key or
//! a value of the wrong type yields the default, so a partially specified or
//! hand-edited params document always produces a usable scene.

use serde_json::Value;

use crate::color::Rgba;

fn lookup<'a, T>(params: &'a Value, name: &str, read: impl FnOnce(&'a Value) -> Option<T>) -> Option<T> {
    params.get(name).and_then(read)
}

/// A number such as a noise scale, alpha or speed. JSON integers count.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    lookup(params, name, Value::as_f64).unwrap_or(default)
}

/// Like [`param_f64`], raised to `min`. Grid and spacing parameters use this
/// so a tiny value cannot blow up the cell count.
pub fn param_f64_at_least(params: &Value, name: &str, default: f64, min: f64) -> f64 {
    param_f64(params, name, default).max(min)
}

/// A count such as levels or a noise step. Floats and negatives are ignored.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    lookup(params, name, Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// A noise seed or octave count. Values past `u32::MAX` are ignored.
pub fn param_u32(params: &Value, name: &str, default: u32) -> u32 {
    lookup(params, name, Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

pub fn param_bool(params: &Value, name: &str, default: bool) -> bool {
    lookup(params, name, Value::as_bool).unwrap_or(default)
}

/// A hex color string (`"#rgb"`, `"#rrggbb"`, `"#rrggbbaa"`). Named CSS
/// colors are not understood and fall back to `default`.
pub fn param_rgba(params: &Value, name: &str, default: Rgba) -> Rgba {
    lookup(params, name, Value::as_str)
        .and_then(|s| Rgba::from_hex(s).ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- param_f64 --

    #[test]
    fn param_f64_reads_drift_speed() {
        let params = json!({"drift_speed": 0.015});
        assert!((param_f64(&params, "drift_speed", 1.0) - 0.015).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_accepts_integer_focal_length() {
        let params = json!({"focal": 600});
        assert!((param_f64(&params, "focal", 0.0) - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_missing_warp_uses_default() {
        let params = json!({"other": 1.0});
        assert!((param_f64(&params, "warp", 0.45) - 0.45).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_string_warp_uses_default() {
        let params = json!({"warp": "strong"});
        assert!((param_f64(&params, "warp", 0.4) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_returns_default_for_null_value() {
        let params = json!({"scale": null});
        assert!((param_f64(&params, "scale", 2.8) - 2.8).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_returns_default_for_non_object() {
        let params = json!("not an object");
        assert!((param_f64(&params, "scale", 7.0) - 7.0).abs() < f64::EPSILON);
    }

    // -- param_f64_at_least --

    #[test]
    fn param_f64_at_least_raises_tiny_cell_size() {
        let params = json!({"cell_size": 1e-6});
        assert_eq!(param_f64_at_least(&params, "cell_size", 2.0, 1.0), 1.0);
    }

    #[test]
    fn param_f64_at_least_keeps_value_above_floor() {
        let params = json!({"cell_size": 6.0});
        assert_eq!(param_f64_at_least(&params, "cell_size", 2.0, 1.0), 6.0);
        assert_eq!(param_f64_at_least(&json!({}), "cell_size", 2.0, 1.0), 2.0);
    }

    // -- param_usize --

    #[test]
    fn param_usize_reads_level_count() {
        let params = json!({"num_levels": 42});
        assert_eq!(param_usize(&params, "num_levels", 0), 42);
    }

    #[test]
    fn param_usize_missing_levels_use_default() {
        let params = json!({});
        assert_eq!(param_usize(&params, "num_levels", 50), 50);
    }

    #[test]
    fn param_usize_returns_default_for_float_value() {
        let params = json!({"noise_step": 2.5});
        assert_eq!(param_usize(&params, "noise_step", 8), 8);
    }

    #[test]
    fn param_usize_returns_default_for_negative_integer() {
        let params = json!({"noise_step": -1});
        assert_eq!(param_usize(&params, "noise_step", 5), 5);
    }

    // -- param_u32 --

    #[test]
    fn param_u32_extracts_seed() {
        let params = json!({"seed": 137});
        assert_eq!(param_u32(&params, "seed", 42), 137);
    }

    #[test]
    fn param_u32_rejects_out_of_range() {
        let params = json!({"seed": 5_000_000_000_u64});
        assert_eq!(param_u32(&params, "seed", 42), 42);
    }

    // -- param_bool --

    #[test]
    fn param_bool_extracts_value() {
        let params = json!({"center_saddles": true});
        assert!(param_bool(&params, "center_saddles", false));
    }

    #[test]
    fn param_bool_returns_default_for_wrong_type() {
        let params = json!({"center_saddles": 1});
        assert!(!param_bool(&params, "center_saddles", false));
    }

    // -- param_rgba --

    #[test]
    fn param_rgba_parses_hex() {
        let params = json!({"color": "#ff0000"});
        assert_eq!(param_rgba(&params, "color", Rgba::WHITE).to_rgb8(), [255, 0, 0]);
    }

    #[test]
    fn param_rgba_falls_back_on_bad_string() {
        let params = json!({"color": "crimson"});
        assert_eq!(param_rgba(&params, "color", Rgba::WHITE), Rgba::WHITE);
    }

    #[test]
    fn param_rgba_falls_back_on_wrong_type() {
        let params = json!({"color": 12});
        assert_eq!(param_rgba(&params, "color", Rgba::BLACK), Rgba::BLACK);
    }
}
