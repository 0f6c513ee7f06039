//! Scalar grids: Gaussian bump deposition and min-max normalization.
//!
//! A [`ScalarField`] stores `cols * rows` f64 values in row-major layout
//! (`row * cols + col`). Unlike a simulation field its values are not clamped:
//! scenes accumulate bumps freely and call [`normalize_field`] once all
//! additive contributions for the frame are in.
//!
//! The free functions operate on plain slices so callers that keep their own
//! buffers can use them directly.

use crate::error::BackdropError;

/// Bumps are truncated to this many standard deviations on each side.
pub const GAUSSIAN_EXTENT: f64 = 3.5;

/// Adds a 2D Gaussian bump to `field`.
///
/// `(cx, cy)` is the normalized center in [0, 1]², `amp` the peak height, and
/// `sigma_cols`/`sigma_rows` the standard deviations in cells. Only cells inside
/// the ±3.5σ box (intersected with the grid) are touched. Non-positive sigmas
/// deposit nothing.
#[allow(clippy::too_many_arguments)]
pub fn add_gaussian(
    field: &mut [f64],
    cols: usize,
    rows: usize,
    cx: f64,
    cy: f64,
    amp: f64,
    sigma_cols: f64,
    sigma_rows: f64,
) {
    if sigma_cols <= 0.0 || sigma_rows <= 0.0 || field.len() < cols * rows {
        return;
    }
    let px = cx * cols as f64;
    let py = cy * rows as f64;
    let x0 = (px - GAUSSIAN_EXTENT * sigma_cols).floor().max(0.0) as usize;
    let x1 = ((px + GAUSSIAN_EXTENT * sigma_cols).ceil().max(0.0) as usize).min(cols);
    let y0 = (py - GAUSSIAN_EXTENT * sigma_rows).floor().max(0.0) as usize;
    let y1 = ((py + GAUSSIAN_EXTENT * sigma_rows).ceil().max(0.0) as usize).min(rows);

    for j in y0..y1 {
        let dy = (j as f64 - py) / sigma_rows;
        let row = &mut field[j * cols..(j + 1) * cols];
        for (i, cell) in row.iter_mut().enumerate().take(x1).skip(x0) {
            let dx = (i as f64 - px) / sigma_cols;
            *cell += amp * (-0.5 * (dx * dx + dy * dy)).exp();
        }
    }
}

/// Rescales `field` to [0, 1] with a single min/max pass.
///
/// A constant field has its range treated as 1, which maps every value to 0.
pub fn normalize_field(field: &mut [f64]) {
    if field.is_empty() {
        return;
    }
    let (min, max) = field
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    let range = if range == 0.0 || !range.is_finite() { 1.0 } else { range };
    field.iter_mut().for_each(|v| *v = (*v - min) / range);
}

/// A dense 2D scalar grid sized by the most recent build.
#[derive(Debug, Clone)]
pub struct ScalarField {
    cols: usize,
    rows: usize,
    data: Vec<f64>,
}

impl Default for ScalarField {
    /// A 1x1 zero grid, the size of a field that has not been built yet.
    fn default() -> Self {
        Self {
            cols: 1,
            rows: 1,
            data: vec![0.0],
        }
    }
}

fn checked_len(cols: usize, rows: usize) -> Result<usize, BackdropError> {
    if cols == 0 || rows == 0 {
        return Err(BackdropError::InvalidDimensions);
    }
    cols.checked_mul(rows).ok_or(BackdropError::InvalidDimensions)
}

impl ScalarField {
    /// Creates a zero-filled grid.
    ///
    /// Returns `BackdropError::InvalidDimensions` if either dimension is zero
    /// or `cols * rows` overflows.
    pub fn new(cols: usize, rows: usize) -> Result<Self, BackdropError> {
        let len = checked_len(cols, rows)?;
        Ok(Self {
            cols,
            rows,
            data: vec![0.0; len],
        })
    }

    /// Creates a grid from a row-major buffer, validating its length.
    pub fn from_data(cols: usize, rows: usize, data: Vec<f64>) -> Result<Self, BackdropError> {
        let len = checked_len(cols, rows)?;
        if data.len() != len {
            return Err(BackdropError::InvalidDimensions);
        }
        Ok(Self { cols, rows, data })
    }

    /// Replaces the buffer with a zeroed one of the new size.
    ///
    /// The old buffer is dropped, so nothing from a previous size can be read
    /// afterwards.
    pub fn rebuild(&mut self, cols: usize, rows: usize) -> Result<(), BackdropError> {
        let len = checked_len(cols, rows)?;
        self.cols = cols;
        self.rows = rows;
        self.data = vec![0.0; len];
        Ok(())
    }

    /// Grid width in cells.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Grid height in cells.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Read-only access to the row-major data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the row-major data.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Value at `(col, row)`, with both indices clamped into the grid.
    pub fn sample_clamped(&self, col: isize, row: isize) -> f64 {
        let c = col.clamp(0, self.cols as isize - 1) as usize;
        let r = row.clamp(0, self.rows as isize - 1) as usize;
        self.data[r * self.cols + c]
    }

    /// Sets every cell to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// See [`add_gaussian`].
    pub fn add_gaussian(&mut self, cx: f64, cy: f64, amp: f64, sigma_cols: f64, sigma_rows: f64) {
        add_gaussian(
            &mut self.data,
            self.cols,
            self.rows,
            cx,
            cy,
            amp,
            sigma_cols,
            sigma_rows,
        );
    }

    /// See [`normalize_field`].
    pub fn normalize(&mut self) {
        normalize_field(&mut self.data);
    }

    /// Smallest and largest value in the grid.
    pub fn min_max(&self) -> (f64, f64) {
        self.data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_single_zero_cell() {
        let field = ScalarField::default();
        assert_eq!((field.cols(), field.rows()), (1, 1));
        assert_eq!(field.data(), &[0.0]);
    }

    #[test]
    fn new_creates_zero_filled_grid() {
        let field = ScalarField::new(4, 3).unwrap();
        assert_eq!(field.cols(), 4);
        assert_eq!(field.rows(), 3);
        assert_eq!(field.data().len(), 12);
        assert!(field.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn new_with_zero_dimension_returns_error() {
        assert!(matches!(
            ScalarField::new(0, 5),
            Err(BackdropError::InvalidDimensions)
        ));
        assert!(ScalarField::new(5, 0).is_err());
    }

    #[test]
    fn new_with_overflow_dimensions_returns_error() {
        assert!(ScalarField::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn from_data_rejects_wrong_length() {
        assert!(ScalarField::from_data(2, 2, vec![0.1, 0.2, 0.3]).is_err());
    }

    #[test]
    fn rebuild_resizes_and_zeroes() {
        let mut field = ScalarField::from_data(2, 2, vec![1.0; 4]).unwrap();
        field.rebuild(3, 5).unwrap();
        assert_eq!(field.data().len(), 15);
        assert!(field.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn sample_clamped_clamps_out_of_range_indices() {
        let field = ScalarField::from_data(2, 2, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(field.sample_clamped(-5, -5), 0.1);
        assert_eq!(field.sample_clamped(9, 0), 0.2);
        assert_eq!(field.sample_clamped(9, 9), 0.4);
    }

    #[test]
    fn gaussian_peaks_at_center() {
        let mut field = ScalarField::new(21, 21).unwrap();
        // Center of cell 10 is at normalized 10/21.
        field.add_gaussian(10.0 / 21.0, 10.0 / 21.0, 1.0, 2.0, 2.0);
        let center = field.data()[10 * 21 + 10];
        assert!((center - 1.0).abs() < 1e-12);
        let neighbor = field.data()[10 * 21 + 11];
        assert!(neighbor < center && neighbor > 0.0);
    }

    #[test]
    fn gaussian_is_clipped_outside_extent() {
        let mut field = ScalarField::new(40, 40).unwrap();
        field.add_gaussian(0.5, 0.5, 1.0, 1.0, 1.0);
        // 20 cells from center, far past 3.5 sigma.
        assert_eq!(field.data()[0], 0.0);
        assert_eq!(field.data()[20 * 40 + 39], 0.0);
    }

    #[test]
    fn gaussian_off_grid_is_harmless() {
        let mut field = ScalarField::new(8, 8).unwrap();
        field.add_gaussian(-3.0, 7.0, 1.0, 1.0, 1.0);
        assert!(field.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn gaussian_with_zero_sigma_deposits_nothing() {
        let mut field = ScalarField::new(8, 8).unwrap();
        field.add_gaussian(0.5, 0.5, 1.0, 0.0, 1.0);
        assert!(field.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn gaussian_bumps_superpose_additively() {
        let mut a = ScalarField::new(16, 16).unwrap();
        a.add_gaussian(0.3, 0.3, 0.5, 2.0, 2.0);
        a.add_gaussian(0.7, 0.6, 0.8, 3.0, 1.5);
        let mut b = ScalarField::new(16, 16).unwrap();
        b.add_gaussian(0.7, 0.6, 0.8, 3.0, 1.5);
        b.add_gaussian(0.3, 0.3, 0.5, 2.0, 2.0);
        for (x, y) in a.data().iter().zip(b.data()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn normalize_maps_to_unit_range() {
        let mut data = vec![-2.0, 0.0, 3.0, 1.0];
        normalize_field(&mut data);
        assert_eq!(data, vec![0.0, 0.4, 1.0, 0.6]);
    }

    #[test]
    fn normalize_constant_field_maps_to_zero() {
        let mut data = vec![0.7; 9];
        normalize_field(&mut data);
        assert!(data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalize_empty_is_noop() {
        let mut data: Vec<f64> = Vec::new();
        normalize_field(&mut data);
        assert!(data.is_empty());
    }

    #[test]
    fn two_bumps_then_normalize_keeps_each_center_at_least_single_bump_value() {
        let (cols, rows) = (32, 32);
        let a = (0.25, 0.25, 0.6);
        let b = (0.7, 0.65, 0.9);
        let idx = |cx: f64, cy: f64| {
            let i = (cx * cols as f64).round() as usize;
            let j = (cy * rows as f64).round() as usize;
            j * cols + i
        };

        let mut only_a = vec![0.0; cols * rows];
        add_gaussian(&mut only_a, cols, rows, a.0, a.1, a.2, 3.0, 3.0);
        let mut only_b = vec![0.0; cols * rows];
        add_gaussian(&mut only_b, cols, rows, b.0, b.1, b.2, 3.0, 3.0);

        let mut both = vec![0.0; cols * rows];
        add_gaussian(&mut both, cols, rows, a.0, a.1, a.2, 3.0, 3.0);
        add_gaussian(&mut both, cols, rows, b.0, b.1, b.2, 3.0, 3.0);
        // Accumulation is monotonic before normalization.
        for k in 0..both.len() {
            assert!(both[k] >= only_a[k] && both[k] >= only_b[k]);
        }
        normalize_field(&mut both);
        for k in [idx(a.0, a.1), idx(b.0, b.1)] {
            assert!(
                both[k] >= only_a[k] && both[k] >= only_b[k],
                "center {k}: {} < single-bump value",
                both[k]
            );
        }
        // The taller bump's center becomes the field maximum.
        assert!((both[idx(b.0, b.1)] - 1.0).abs() < 1e-9);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_yields_exact_unit_bounds_for_non_constant_input(
                data in prop::collection::vec(-1e6_f64..1e6, 2..512),
            ) {
                let mut data = data;
                let (lo, hi) = data.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(l, h), &v| (l.min(v), h.max(v)));
                prop_assume!(hi > lo);
                normalize_field(&mut data);
                let (lo, hi) = data.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(l, h), &v| (l.min(v), h.max(v)));
                prop_assert!(lo.abs() < 1e-9, "min after normalize = {lo}");
                prop_assert!((hi - 1.0).abs() < 1e-9, "max after normalize = {hi}");
            }

            #[test]
            fn gaussian_never_decreases_any_cell(
                cols in 1_usize..48,
                rows in 1_usize..48,
                cx in -0.5_f64..1.5,
                cy in -0.5_f64..1.5,
                amp in 0.0_f64..5.0,
                sigma in 0.1_f64..10.0,
            ) {
                let mut field = ScalarField::new(cols, rows).unwrap();
                field.add_gaussian(0.5, 0.5, 0.3, 2.0, 2.0);
                let before = field.data().to_vec();
                field.add_gaussian(cx, cy, amp, sigma, sigma);
                for (b, a) in before.iter().zip(field.data()) {
                    prop_assert!(a >= b);
                }
            }
        }
    }
}
