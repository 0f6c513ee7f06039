//! Shared field pipeline for the noise-driven scenes.
//!
//! Domain-warped FBM is evaluated on a coarse grid (one sample every
//! `noise_step` fine cells), bilinearly upsampled into the fine
//! [`ScalarField`], and normalized. [`CursorInfluence`] then deposits the
//! cursor and trail bumps in normalized field units.

use serde::{Deserialize, Serialize};

use crate::cursor::CursorState;
use crate::error::BackdropError;
use crate::field::ScalarField;
use crate::noise::{Fbm, GradientNoise};

/// Presence below this deposits no cursor bump.
pub const PRESENCE_CUTOFF: f64 = 0.001;

/// Parameters of the domain-warped FBM terrain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpedFbmConfig {
    pub seed: u32,
    pub octaves: u32,
    pub warp_seed: u32,
    pub warp_octaves: u32,
    /// Noise-space units across the whole grid.
    pub scale: f64,
    /// Warp displacement, in noise-space units.
    pub warp: f64,
    /// Terrain drift, noise units per second.
    pub drift_speed: f64,
    /// Warp drift, noise units per second.
    pub warp_drift_speed: f64,
    /// Fine cells per coarse sample.
    pub noise_step: usize,
}

impl Default for WarpedFbmConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            octaves: 4,
            warp_seed: 137,
            warp_octaves: 2,
            scale: 2.8,
            warp: 0.45,
            drift_speed: 0.015,
            warp_drift_speed: 0.008,
            noise_step: 8,
        }
    }
}

/// Coarse-sampled, upsampled and normalized warped FBM over a fine grid.
#[derive(Debug, Clone)]
pub struct ProceduralField {
    config: WarpedFbmConfig,
    primary: Fbm<GradientNoise>,
    warp: Fbm<GradientNoise>,
    field: ScalarField,
    coarse: ScalarField,
}

impl ProceduralField {
    pub fn new(config: WarpedFbmConfig) -> Self {
        Self {
            primary: Fbm::seeded(config.seed, config.octaves),
            warp: Fbm::seeded(config.warp_seed, config.warp_octaves),
            config,
            field: ScalarField::default(),
            coarse: ScalarField::default(),
        }
    }

    pub fn config(&self) -> &WarpedFbmConfig {
        &self.config
    }

    fn step(&self) -> usize {
        self.config.noise_step.max(1)
    }

    /// Resizes both grids. The coarse grid is `ceil(cols / step) + 2` by
    /// `ceil(rows / step) + 2`.
    pub fn build(&mut self, cols: usize, rows: usize) -> Result<(), BackdropError> {
        let step = self.step();
        self.field.rebuild(cols, rows)?;
        self.coarse
            .rebuild(cols.div_ceil(step) + 2, rows.div_ceil(step) + 2)?;
        Ok(())
    }

    pub fn field(&self) -> &ScalarField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ScalarField {
        &mut self.field
    }

    /// Coarse grid dimensions `(cols, rows)`.
    pub fn coarse_dims(&self) -> (usize, usize) {
        (self.coarse.cols(), self.coarse.rows())
    }

    /// Fills the fine field with the terrain at `elapsed` seconds, normalized
    /// to [0, 1].
    pub fn sample(&mut self, elapsed: f64) {
        self.sample_coarse(elapsed);
        self.upsample();
        self.field.normalize();
    }

    fn sample_coarse(&mut self, elapsed: f64) {
        let cfg = self.config;
        let drift = elapsed * cfg.drift_speed;
        let wd = elapsed * cfg.warp_drift_speed;
        let step = self.step() as f64;
        let cols = self.field.cols() as f64;
        let rows = self.field.rows() as f64;
        let n_cols = self.coarse.cols();

        for (k, cell) in self.coarse.data_mut().iter_mut().enumerate() {
            let ni = (k % n_cols) as f64;
            let nj = (k / n_cols) as f64;
            let x = (ni * step / cols) * cfg.scale;
            let y = (nj * step / rows) * cfg.scale;
            let wx = self.warp.sample(x + wd, y + wd * 0.7) * cfg.warp;
            let wy = self.warp.sample(x + 3.7 - wd * 0.5, y + 1.8 + wd) * cfg.warp;
            *cell = self.primary.sample(x + wx + drift, y + wy + drift * 0.6);
        }
    }

    fn upsample(&mut self) {
        let step_inv = 1.0 / self.step() as f64;
        let (n_cols, n_rows) = self.coarse_dims();
        let cols = self.field.cols();
        let coarse = self.coarse.data();

        for (j, row) in self.field.data_mut().chunks_exact_mut(cols).enumerate() {
            let cj = j as f64 * step_inv;
            let cj0 = (cj.floor() as usize).min(n_rows - 1);
            let cj1 = (cj0 + 1).min(n_rows - 1);
            let ty = cj - cj.floor();
            let r0 = cj0 * n_cols;
            let r1 = cj1 * n_cols;
            for (i, cell) in row.iter_mut().enumerate() {
                let ci = i as f64 * step_inv;
                let ci0 = (ci.floor() as usize).min(n_cols - 1);
                let ci1 = (ci0 + 1).min(n_cols - 1);
                let tx = ci - ci.floor();
                let top = (1.0 - tx) * coarse[r0 + ci0] + tx * coarse[r0 + ci1];
                let bottom = (1.0 - tx) * coarse[r1 + ci0] + tx * coarse[r1 + ci1];
                *cell = (1.0 - ty) * top + ty * bottom;
            }
        }
    }
}

/// Gaussian heights and widths for the cursor and its trail. Sigmas are
/// fractions of the viewport's shorter side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorInfluence {
    pub cursor_amp: f64,
    pub cursor_sigma: f64,
    pub trail_amp: f64,
    pub trail_sigma: f64,
}

impl Default for CursorInfluence {
    fn default() -> Self {
        Self {
            cursor_amp: 0.42,
            cursor_sigma: 0.09,
            trail_amp: 0.26,
            trail_sigma: 0.07,
        }
    }
}

impl CursorInfluence {
    /// Deposits the smoothed cursor (scaled by presence) and every trail
    /// peak into `field`. `min_dim` is the shorter viewport side in pixels.
    pub fn deposit(&self, field: &mut ScalarField, cursor: &CursorState<'_>, min_dim: f64, cell_size: f64) {
        if cell_size <= 0.0 {
            return;
        }
        if cursor.amp > PRESENCE_CUTOFF {
            let s = self.cursor_sigma * min_dim / cell_size;
            field.add_gaussian(
                cursor.smoothed.x,
                cursor.smoothed.y,
                cursor.amp * self.cursor_amp,
                s,
                s,
            );
        }
        let s = self.trail_sigma * min_dim / cell_size;
        for peak in cursor.trail {
            field.add_gaussian(peak.x, peak.y, peak.amp * self.trail_amp, s, s);
        }
    }
}
