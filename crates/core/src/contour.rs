//! Marching-squares iso-line extraction over a normalized scalar grid.
//!
//! Each grid cell is classified per level by a 4-bit corner code (TL=1, TR=2,
//! BR=4, BL=8; a corner is "above" when `value >= level`). [`CASE_TABLE`]
//! maps the code to edge pairs (0=top, 1=right, 2=bottom, 3=left) and each
//! edge crossing is linearly interpolated between its corners.
//!
//! Per cell only the levels inside the corner min/max range are evaluated, so
//! the cost scales with the number of crossings rather than `cells * levels`.

use crate::color::Rgba;
use crate::surface::{LineCap, LineJoin, Surface};

/// Corner values closer than this are treated as equal; the crossing is then
/// placed at the edge midpoint.
pub const FLAT_EPSILON: f64 = 1e-10;

/// Edge pairs emitted for each corner code. Saddles (5 and 10) emit both
/// pairs, connecting the two "above" corners through the cell.
pub const CASE_TABLE: [&[(u8, u8)]; 16] = [
    &[],
    &[(0, 3)],
    &[(0, 1)],
    &[(1, 3)],
    &[(1, 2)],
    &[(0, 1), (2, 3)],
    &[(0, 2)],
    &[(2, 3)],
    &[(2, 3)],
    &[(0, 2)],
    &[(0, 3), (1, 2)],
    &[(1, 2)],
    &[(1, 3)],
    &[(0, 1)],
    &[(0, 3)],
    &[],
];

const SADDLE_5_SPLIT: &[(u8, u8)] = &[(0, 3), (1, 2)];
const SADDLE_10_SPLIT: &[(u8, u8)] = &[(0, 1), (2, 3)];

/// One straight contour piece in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Iso value of level `n` out of `num_levels`: `(n + 0.5) / num_levels`.
#[inline]
pub fn level_value(n: usize, num_levels: usize) -> f64 {
    (n as f64 + 0.5) / num_levels as f64
}

/// Inclusive range of level indices whose iso value can cross a cell with
/// corner extremes `min..=max`. `None` when no level lies inside.
pub fn level_range(min: f64, max: f64, num_levels: usize) -> Option<(usize, usize)> {
    if num_levels == 0 {
        return None;
    }
    let levels = num_levels as f64;
    let start = (min * levels - 0.5).ceil().max(0.0);
    let end = (max * levels - 0.5).floor().min(levels - 1.0);
    if start.is_nan() || end < start {
        return None;
    }
    Some((start as usize, end as usize))
}

/// 4-bit corner code of a cell for iso value `level`.
#[inline]
pub fn case_code(tl: f64, tr: f64, br: f64, bl: f64, level: f64) -> u8 {
    u8::from(tl >= level)
        | u8::from(tr >= level) << 1
        | u8::from(br >= level) << 2
        | u8::from(bl >= level) << 3
}

/// Selects which levels a pass extracts. Every `interval`-th level
/// (`n % interval == 0`) is an index level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    IndexOnly { interval: usize },
    ExceptIndex { interval: usize },
}

impl LevelFilter {
    /// Whether level `n` passes. An interval of 0 means there are no index
    /// levels.
    pub fn accepts(self, n: usize) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::IndexOnly { interval } => interval != 0 && n % interval == 0,
            LevelFilter::ExceptIndex { interval } => interval == 0 || n % interval != 0,
        }
    }
}

/// How the ambiguous saddle cases (codes 5 and 10) are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaddlePolicy {
    /// Always connect the two "above" corners (the fixed table).
    #[default]
    BothDiagonals,
    /// Connect the "above" corners only when the cell-center average is also
    /// above the level; otherwise separate them.
    CenterSample,
}

impl SaddlePolicy {
    fn pairs(self, code: u8, center: f64, level: f64) -> &'static [(u8, u8)] {
        match (self, code) {
            (SaddlePolicy::CenterSample, 5) if center < level => SADDLE_5_SPLIT,
            (SaddlePolicy::CenterSample, 10) if center < level => SADDLE_10_SPLIT,
            _ => CASE_TABLE[usize::from(code)],
        }
    }
}

struct Cell {
    x: f64,
    y: f64,
    tl: f64,
    tr: f64,
    br: f64,
    bl: f64,
}

#[inline]
fn crossing(level: f64, from: f64, to: f64) -> f64 {
    let d = to - from;
    if d.abs() < FLAT_EPSILON {
        0.5
    } else {
        (level - from) / d
    }
}

impl Cell {
    fn edge_point(&self, edge: u8, level: f64, cell_size: f64) -> (f64, f64) {
        match edge {
            0 => (self.x + crossing(level, self.tl, self.tr) * cell_size, self.y),
            1 => (
                self.x + cell_size,
                self.y + crossing(level, self.tr, self.br) * cell_size,
            ),
            2 => (
                self.x + crossing(level, self.bl, self.br) * cell_size,
                self.y + cell_size,
            ),
            _ => (self.x, self.y + crossing(level, self.tl, self.bl) * cell_size),
        }
    }
}

/// Streams every contour segment of the accepted levels into `sink`, using
/// the default saddle policy.
///
/// `field` is row-major `cols * rows`; grids smaller than 2x2 or shorter than
/// `cols * rows` produce nothing.
#[allow(clippy::too_many_arguments)]
pub fn extract_segments(
    field: &[f64],
    cols: usize,
    rows: usize,
    cell_size: f64,
    num_levels: usize,
    filter: LevelFilter,
    sink: impl FnMut(Segment),
) {
    extract_segments_with(
        field,
        cols,
        rows,
        cell_size,
        num_levels,
        filter,
        SaddlePolicy::default(),
        sink,
    );
}

/// [`extract_segments`] with an explicit saddle policy.
#[allow(clippy::too_many_arguments)]
pub fn extract_segments_with(
    field: &[f64],
    cols: usize,
    rows: usize,
    cell_size: f64,
    num_levels: usize,
    filter: LevelFilter,
    saddle: SaddlePolicy,
    mut sink: impl FnMut(Segment),
) {
    if cols < 2 || rows < 2 || num_levels == 0 || field.len() < cols * rows {
        return;
    }
    for row in 0..rows - 1 {
        for col in 0..cols - 1 {
            let i = row * cols + col;
            let cell = Cell {
                x: col as f64 * cell_size,
                y: row as f64 * cell_size,
                tl: field[i],
                tr: field[i + 1],
                br: field[i + cols + 1],
                bl: field[i + cols],
            };
            let min = cell.tl.min(cell.tr).min(cell.br).min(cell.bl);
            let max = cell.tl.max(cell.tr).max(cell.br).max(cell.bl);
            let Some((start, end)) = level_range(min, max, num_levels) else {
                continue;
            };
            let center = (cell.tl + cell.tr + cell.br + cell.bl) * 0.25;

            for n in start..=end {
                if !filter.accepts(n) {
                    continue;
                }
                let level = level_value(n, num_levels);
                let code = case_code(cell.tl, cell.tr, cell.br, cell.bl, level);
                for &(a, b) in saddle.pairs(code, center, level) {
                    let (x0, y0) = cell.edge_point(a, level, cell_size);
                    let (x1, y1) = cell.edge_point(b, level, cell_size);
                    sink(Segment { x0, y0, x1, y1 });
                }
            }
        }
    }
}

/// Stroke styling for [`draw_contours`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourStyle {
    pub cell_size: f64,
    pub num_levels: usize,
    /// Every `index_interval`-th level is drawn in the index pass; 0 disables
    /// the index pass.
    pub index_interval: usize,
    pub color: Rgba,
    pub base_alpha: f64,
    pub base_width: f64,
    pub index_alpha: f64,
    pub index_width: f64,
    pub saddle: SaddlePolicy,
}

impl Default for ContourStyle {
    fn default() -> Self {
        Self {
            cell_size: 2.0,
            num_levels: 50,
            index_interval: 5,
            color: Rgba::WHITE,
            base_alpha: 0.09,
            base_width: 0.5,
            index_alpha: 0.22,
            index_width: 1.0,
            saddle: SaddlePolicy::BothDiagonals,
        }
    }
}

/// Strokes the contours of `field` in two batched passes: ordinary levels
/// thin and faint, then index levels bolder and brighter. Each pass is a
/// single path stroked once with round caps and joins.
pub fn draw_contours(
    surface: &mut dyn Surface,
    field: &[f64],
    cols: usize,
    rows: usize,
    style: &ContourStyle,
) {
    let interval = style.index_interval;
    let ordinary = if interval == 0 {
        LevelFilter::All
    } else {
        LevelFilter::ExceptIndex { interval }
    };

    surface.set_line_cap(LineCap::Round);
    surface.set_line_join(LineJoin::Round);

    stroke_pass(
        surface,
        field,
        cols,
        rows,
        style,
        ordinary,
        style.base_width,
        style.base_alpha,
    );
    if interval != 0 {
        stroke_pass(
            surface,
            field,
            cols,
            rows,
            style,
            LevelFilter::IndexOnly { interval },
            style.index_width,
            style.index_alpha,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn stroke_pass(
    surface: &mut dyn Surface,
    field: &[f64],
    cols: usize,
    rows: usize,
    style: &ContourStyle,
    filter: LevelFilter,
    width: f64,
    alpha: f64,
) {
    surface.set_stroke_color(style.color.with_alpha(alpha));
    surface.set_line_width(width);
    surface.begin_path();
    extract_segments_with(
        field,
        cols,
        rows,
        style.cell_size,
        style.num_levels,
        filter,
        style.saddle,
        |s| {
            surface.move_to(s.x0, s.y0);
            surface.line_to(s.x1, s.y1);
        },
    );
    surface.stroke();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, RecordingSurface};

    fn collect(
        field: &[f64],
        cols: usize,
        rows: usize,
        levels: usize,
        saddle: SaddlePolicy,
    ) -> Vec<Segment> {
        let mut out = Vec::new();
        extract_segments_with(
            field,
            cols,
            rows,
            1.0,
            levels,
            LevelFilter::All,
            saddle,
            |s| out.push(s),
        );
        out
    }

    fn corners_differ(code: u8, a: u8, b: u8) -> bool {
        (code & a != 0) != (code & b != 0)
    }

    // -- case table --

    #[test]
    fn case_table_edges_match_crossed_edges() {
        for code in 0u8..16 {
            let mut crossed = Vec::new();
            if corners_differ(code, 1, 2) {
                crossed.push(0);
            }
            if corners_differ(code, 2, 4) {
                crossed.push(1);
            }
            if corners_differ(code, 8, 4) {
                crossed.push(2);
            }
            if corners_differ(code, 1, 8) {
                crossed.push(3);
            }
            let mut emitted: Vec<u8> = CASE_TABLE[usize::from(code)]
                .iter()
                .flat_map(|&(a, b)| [a, b])
                .collect();
            emitted.sort_unstable();
            assert_eq!(emitted, crossed, "case {code}");
        }
    }

    #[test]
    fn saddle_cases_emit_two_segments() {
        assert_eq!(CASE_TABLE[5].len(), 2);
        assert_eq!(CASE_TABLE[10].len(), 2);
    }

    #[test]
    fn case_code_sets_corner_bits() {
        assert_eq!(case_code(1.0, 0.0, 0.0, 0.0, 0.5), 1);
        assert_eq!(case_code(0.0, 1.0, 0.0, 0.0, 0.5), 2);
        assert_eq!(case_code(0.0, 0.0, 1.0, 0.0, 0.5), 4);
        assert_eq!(case_code(0.0, 0.0, 0.0, 1.0, 0.5), 8);
        assert_eq!(case_code(0.5, 0.5, 0.5, 0.5, 0.5), 15);
    }

    // -- levels --

    #[test]
    fn level_values_are_centered_in_bins() {
        assert_eq!(level_value(0, 1), 0.5);
        assert_eq!(level_value(0, 50), 0.01);
        assert!((level_value(49, 50) - 0.99).abs() < 1e-12);
    }

    #[test]
    fn level_range_rejects_flat_and_empty_cells() {
        assert_eq!(level_range(0.0, 0.0, 50), None);
        assert_eq!(level_range(0.2, 0.5, 0), None);
        assert_eq!(level_range(0.995, 1.0, 50), None);
    }

    #[test]
    fn level_range_covers_interior_levels() {
        assert_eq!(level_range(0.0, 1.0, 50), Some((0, 49)));
        assert_eq!(level_range(0.1, 0.2, 10), Some((1, 1)));
    }

    #[test]
    fn level_filter_splits_index_levels() {
        let idx = LevelFilter::IndexOnly { interval: 5 };
        let rest = LevelFilter::ExceptIndex { interval: 5 };
        for n in 0..20 {
            assert_ne!(idx.accepts(n), rest.accepts(n), "level {n}");
        }
        assert!(idx.accepts(0) && idx.accepts(10));
        assert!(!LevelFilter::IndexOnly { interval: 0 }.accepts(0));
        assert!(LevelFilter::ExceptIndex { interval: 0 }.accepts(0));
    }

    // -- extraction --

    #[test]
    fn single_raised_corner_yields_one_segment() {
        let mut field = vec![0.0; 16];
        field[0] = 1.0;
        let mut segs = Vec::new();
        extract_segments(&field, 4, 4, 10.0, 1, LevelFilter::All, |s| segs.push(s));
        assert_eq!(segs.len(), 1);
        let s = segs[0];
        // top edge midpoint, then left edge midpoint
        assert_eq!((s.x0, s.y0), (5.0, 0.0));
        assert_eq!((s.x1, s.y1), (0.0, 5.0));
    }

    #[test]
    fn flat_edge_crossing_falls_back_to_midpoint() {
        assert_eq!(crossing(0.5, 0.3, 0.3), 0.5);
        assert_eq!(crossing(0.5, 0.0, 1.0), 0.5);
        assert_eq!(crossing(0.25, 0.0, 1.0), 0.25);
    }

    #[test]
    fn undersized_inputs_produce_nothing() {
        assert!(collect(&[1.0], 1, 1, 4, SaddlePolicy::BothDiagonals).is_empty());
        assert!(collect(&[0.0, 1.0, 0.0], 2, 2, 4, SaddlePolicy::BothDiagonals).is_empty());
        assert!(collect(&[0.0, 1.0, 1.0, 0.0], 2, 2, 0, SaddlePolicy::BothDiagonals).is_empty());
    }

    #[test]
    fn saddle_policy_center_sample_resolves_by_average() {
        // code 5, center average 0.3 < 0.5
        let field = [0.6, 0.0, 0.0, 0.6];
        let both = collect(&field, 2, 2, 1, SaddlePolicy::BothDiagonals);
        let center = collect(&field, 2, 2, 1, SaddlePolicy::CenterSample);
        assert_eq!(both.len(), 2);
        assert_eq!(center.len(), 2);
        // both-diagonals cuts off TR (top -> right edge)
        assert_eq!(both[0].y0, 0.0);
        assert_eq!(both[0].x1, 1.0);
        // center-sample cuts off TL (top -> left edge)
        assert_eq!(center[0].y0, 0.0);
        assert_eq!(center[0].x1, 0.0);
    }

    #[test]
    fn saddle_policy_center_sample_keeps_connection_when_center_above() {
        let field = [1.0, 0.4, 0.4, 1.0];
        let both = collect(&field, 2, 2, 1, SaddlePolicy::BothDiagonals);
        let center = collect(&field, 2, 2, 1, SaddlePolicy::CenterSample);
        assert_eq!(both, center);
    }

    // -- drawing --

    #[test]
    fn draw_contours_strokes_two_batched_passes() {
        let field: Vec<f64> = (0..64).map(|i| (i % 8) as f64 / 7.0).collect();
        let mut surface = RecordingSurface::new();
        draw_contours(&mut surface, &field, 8, 8, &ContourStyle::default());
        assert_eq!(surface.count(|op| matches!(op, DrawOp::Stroke)), 2);
        assert_eq!(surface.count(|op| matches!(op, DrawOp::BeginPath)), 2);
        assert!(surface.count(|op| matches!(op, DrawOp::MoveTo(..))) > 0);
        assert_eq!(
            surface.count(|op| *op == DrawOp::LineCap(LineCap::Round)),
            1
        );
        assert_eq!(surface.count(|op| *op == DrawOp::LineWidth(0.5)), 1);
        assert_eq!(surface.count(|op| *op == DrawOp::LineWidth(1.0)), 1);
    }

    #[test]
    fn draw_contours_without_index_interval_uses_one_pass() {
        let field: Vec<f64> = (0..16).map(|i| (i % 4) as f64 / 3.0).collect();
        let style = ContourStyle {
            index_interval: 0,
            ..ContourStyle::default()
        };
        let mut surface = RecordingSurface::new();
        draw_contours(&mut surface, &field, 4, 4, &style);
        assert_eq!(surface.count(|op| matches!(op, DrawOp::Stroke)), 1);
    }

    #[test]
    fn draw_contours_splits_levels_between_passes() {
        let field: Vec<f64> = (0..100).map(|i| (i % 10) as f64 / 9.0).collect();
        let style = ContourStyle {
            cell_size: 1.0,
            num_levels: 10,
            index_interval: 5,
            ..ContourStyle::default()
        };
        let mut total = 0;
        extract_segments(&field, 10, 10, 1.0, 10, LevelFilter::All, |_| total += 1);

        let mut surface = RecordingSurface::new();
        draw_contours(&mut surface, &field, 10, 10, &style);
        assert_eq!(surface.count(|op| matches!(op, DrawOp::MoveTo(..))), total);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn levels_outside_range_never_cross(
                corners in prop::array::uniform4(0.0_f64..=1.0),
                levels in 1_usize..80,
            ) {
                let [tl, tr, br, bl] = corners;
                let min = tl.min(tr).min(br).min(bl);
                let max = tl.max(tr).max(br).max(bl);
                let range = level_range(min, max, levels);
                for n in 0..levels {
                    let inside = range.is_some_and(|(s, e)| n >= s && n <= e);
                    if inside {
                        continue;
                    }
                    let code = case_code(tl, tr, br, bl, level_value(n, levels));
                    prop_assert!(code == 0 || code == 15, "level {n} crosses with code {code}");
                }
            }

            #[test]
            fn segments_stay_inside_their_grid(
                data in prop::collection::vec(0.0_f64..=1.0, 36),
                levels in 1_usize..20,
            ) {
                let mut segs = Vec::new();
                extract_segments(&data, 6, 6, 3.0, levels, LevelFilter::All, |s| segs.push(s));
                for s in segs {
                    for v in [s.x0, s.y0, s.x1, s.y1] {
                        prop_assert!((0.0..=15.0).contains(&v), "coordinate {v} out of grid");
                    }
                }
            }
        }
    }
}
