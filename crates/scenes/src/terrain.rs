//! JSON plumbing shared by the scenes built on the warped-FBM pipeline.

use backdrop_core::params::{param_f64, param_u32, param_usize};
use backdrop_core::{CursorInfluence, WarpedFbmConfig};
use serde_json::{json, Map, Value};

pub(crate) fn terrain_from_json(params: &Value, d: WarpedFbmConfig) -> WarpedFbmConfig {
    WarpedFbmConfig {
        seed: param_u32(params, "seed", d.seed),
        octaves: param_u32(params, "octaves", d.octaves),
        warp_seed: param_u32(params, "warp_seed", d.warp_seed),
        warp_octaves: param_u32(params, "warp_octaves", d.warp_octaves),
        scale: param_f64(params, "scale", d.scale),
        warp: param_f64(params, "warp", d.warp),
        drift_speed: param_f64(params, "drift_speed", d.drift_speed),
        warp_drift_speed: param_f64(params, "warp_drift_speed", d.warp_drift_speed),
        noise_step: param_usize(params, "noise_step", d.noise_step),
    }
}

pub(crate) fn terrain_params(cfg: &WarpedFbmConfig) -> Value {
    json!({
        "seed": cfg.seed,
        "octaves": cfg.octaves,
        "warp_seed": cfg.warp_seed,
        "warp_octaves": cfg.warp_octaves,
        "scale": cfg.scale,
        "warp": cfg.warp,
        "drift_speed": cfg.drift_speed,
        "warp_drift_speed": cfg.warp_drift_speed,
        "noise_step": cfg.noise_step,
    })
}

pub(crate) fn terrain_schema(d: &WarpedFbmConfig) -> Value {
    json!({
        "seed": {
            "type": "integer",
            "default": d.seed,
            "description": "Seed of the terrain noise"
        },
        "octaves": {
            "type": "integer",
            "default": d.octaves,
            "min": 1,
            "max": 8,
            "description": "FBM octaves of the terrain noise"
        },
        "warp_seed": {
            "type": "integer",
            "default": d.warp_seed,
            "description": "Seed of the domain-warp noise"
        },
        "warp_octaves": {
            "type": "integer",
            "default": d.warp_octaves,
            "min": 1,
            "max": 8,
            "description": "FBM octaves of the domain-warp noise"
        },
        "scale": {
            "type": "number",
            "default": d.scale,
            "min": 0.1,
            "max": 20.0,
            "description": "Noise-space units across the viewport"
        },
        "warp": {
            "type": "number",
            "default": d.warp,
            "min": 0.0,
            "max": 2.0,
            "description": "Domain-warp displacement"
        },
        "drift_speed": {
            "type": "number",
            "default": d.drift_speed,
            "min": 0.0,
            "max": 1.0,
            "description": "Terrain drift in noise units per second"
        },
        "warp_drift_speed": {
            "type": "number",
            "default": d.warp_drift_speed,
            "min": 0.0,
            "max": 1.0,
            "description": "Warp drift in noise units per second"
        },
        "noise_step": {
            "type": "integer",
            "default": d.noise_step,
            "min": 1,
            "max": 32,
            "description": "Grid cells per coarse noise sample"
        }
    })
}

pub(crate) fn influence_from_json(params: &Value, d: CursorInfluence) -> CursorInfluence {
    CursorInfluence {
        cursor_amp: param_f64(params, "cursor_amp", d.cursor_amp),
        cursor_sigma: param_f64(params, "cursor_sigma", d.cursor_sigma),
        trail_amp: param_f64(params, "trail_amp", d.trail_amp),
        trail_sigma: param_f64(params, "trail_sigma", d.trail_sigma),
    }
}

pub(crate) fn influence_params(inf: &CursorInfluence) -> Value {
    json!({
        "cursor_amp": inf.cursor_amp,
        "cursor_sigma": inf.cursor_sigma,
        "trail_amp": inf.trail_amp,
        "trail_sigma": inf.trail_sigma,
    })
}

pub(crate) fn influence_schema(d: &CursorInfluence) -> Value {
    json!({
        "cursor_amp": {
            "type": "number",
            "default": d.cursor_amp,
            "min": 0.0,
            "max": 2.0,
            "description": "Height of the bump under the cursor"
        },
        "cursor_sigma": {
            "type": "number",
            "default": d.cursor_sigma,
            "min": 0.0,
            "max": 0.5,
            "description": "Cursor bump width as a fraction of the shorter viewport side"
        },
        "trail_amp": {
            "type": "number",
            "default": d.trail_amp,
            "min": 0.0,
            "max": 2.0,
            "description": "Height of trail bumps"
        },
        "trail_sigma": {
            "type": "number",
            "default": d.trail_sigma,
            "min": 0.0,
            "max": 0.5,
            "description": "Trail bump width as a fraction of the shorter viewport side"
        }
    })
}

/// Shallow-merges JSON objects left to right; non-objects are skipped.
pub(crate) fn merge_objects(parts: impl IntoIterator<Item = Value>) -> Value {
    let mut out = Map::new();
    for part in parts {
        if let Value::Object(map) = part {
            out.extend(map);
        }
    }
    Value::Object(out)
}
