//! Scanline polygon coverage.
//!
//! Polygons are lists of closed contours in device pixels. Coverage is
//! computed with the nonzero winding rule on `SUBSAMPLES` sub-scanlines per
//! pixel row, with exact horizontal span fractions on each sub-scanline.

use glam::DVec2;

/// Sub-scanlines per pixel row.
pub const SUBSAMPLES: usize = 4;

/// A closed polygon contour. The last point connects back to the first.
pub type Contour = Vec<DVec2>;

#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f64,
    y0: f64,
    slope: f64,
    y1: f64,
    winding: i32,
}

impl Edge {
    fn new(a: DVec2, b: DVec2) -> Option<Self> {
        if a.y == b.y || !(a.is_finite() && b.is_finite()) {
            return None;
        }
        let (top, bottom, winding) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
        Some(Self {
            x0: top.x,
            y0: top.y,
            slope: (bottom.x - top.x) / (bottom.y - top.y),
            y1: bottom.y,
            winding,
        })
    }

    fn x_at(&self, y: f64) -> f64 {
        self.x0 + (y - self.y0) * self.slope
    }
}

/// Twice the signed area; positive for clockwise contours in y-down space.
pub fn signed_area(contour: &[DVec2]) -> f64 {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let a = contour[i];
            let b = contour[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

/// Reverses `contour` if needed so every contour winds the same way and
/// overlapping pieces union under the nonzero rule.
pub fn oriented(mut contour: Contour) -> Contour {
    if signed_area(&contour) < 0.0 {
        contour.reverse();
    }
    contour
}

/// Regular polygon approximating a circle, wound like [`oriented`] output.
pub fn circle(center: DVec2, radius: f64) -> Contour {
    let n = ((radius * 2.0).ceil() as usize + 6).clamp(8, 64);
    let contour = (0..n)
        .map(|i| {
            let a = i as f64 / n as f64 * std::f64::consts::TAU;
            center + DVec2::new(a.cos(), a.sin()) * radius
        })
        .collect();
    oriented(contour)
}

/// Calls `visit(x, y, coverage)` for every pixel of a `width x height`
/// grid with nonzero coverage by `contours`, row by row.
pub fn rasterize(contours: &[Contour], width: usize, height: usize, mut visit: impl FnMut(usize, usize, f32)) {
    if width == 0 || height == 0 {
        return;
    }
    let mut edges: Vec<Edge> = contours
        .iter()
        .filter(|c| c.len() >= 2)
        .flat_map(|c| (0..c.len()).filter_map(move |i| Edge::new(c[i], c[(i + 1) % c.len()])))
        .collect();
    if edges.is_empty() {
        return;
    }
    edges.sort_by(|a, b| a.y0.total_cmp(&b.y0));

    let y_min = edges[0].y0.floor().max(0.0) as usize;
    let y_max = edges
        .iter()
        .map(|e| e.y1)
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .clamp(0.0, height as f64) as usize;

    let w = width as f64;
    let weight = 1.0 / SUBSAMPLES as f64;
    let mut acc = vec![0.0_f64; width];
    let mut active: Vec<usize> = Vec::new();
    let mut crossings: Vec<(f64, i32)> = Vec::new();
    let mut next = 0;

    for row in y_min..y_max {
        acc.iter_mut().for_each(|a| *a = 0.0);
        let mut touched = false;

        for sub in 0..SUBSAMPLES {
            let y = row as f64 + (sub as f64 + 0.5) * weight;
            while next < edges.len() && edges[next].y0 <= y {
                active.push(next);
                next += 1;
            }
            active.retain(|&i| edges[i].y1 > y);

            crossings.clear();
            crossings.extend(
                active
                    .iter()
                    .filter(|&&i| edges[i].y0 <= y)
                    .map(|&i| (edges[i].x_at(y), edges[i].winding)),
            );
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            let mut span_start = 0.0;
            for &(x, dir) in &crossings {
                let was_inside = winding != 0;
                winding += dir;
                let inside = winding != 0;
                if !was_inside && inside {
                    span_start = x;
                } else if was_inside && !inside {
                    touched |= add_span(&mut acc, span_start.clamp(0.0, w), x.clamp(0.0, w), weight);
                }
            }
        }

        if touched {
            for (x, &c) in acc.iter().enumerate() {
                if c > 0.0 {
                    visit(x, row, c.min(1.0) as f32);
                }
            }
        }
    }
}

/// Adds `weight` times the covered fraction of each pixel in `[xa, xb)`.
fn add_span(acc: &mut [f64], xa: f64, xb: f64, weight: f64) -> bool {
    if xb <= xa {
        return false;
    }
    let last = acc.len() - 1;
    let ia = (xa.floor() as usize).min(last);
    let ib = (xb.floor() as usize).min(last);
    if ia == ib {
        acc[ia] += (xb - xa) * weight;
        return true;
    }
    acc[ia] += (ia as f64 + 1.0 - xa) * weight;
    for cell in &mut acc[ia + 1..ib] {
        *cell += weight;
    }
    acc[ib] += (xb - ib as f64) * weight;
    true
}

/// Coverage mask of `contours` over a `width x height` grid.
pub fn coverage_mask(contours: &[Contour], width: usize, height: usize) -> Vec<f32> {
    let mut mask = vec![0.0; width * height];
    rasterize(contours, width, height, |x, y, c| mask[y * width + x] = c);
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
        vec![
            DVec2::new(x0, y0),
            DVec2::new(x1, y0),
            DVec2::new(x1, y1),
            DVec2::new(x0, y1),
        ]
    }

    fn total(mask: &[f32]) -> f64 {
        mask.iter().map(|&c| f64::from(c)).sum()
    }

    #[test]
    fn pixel_aligned_square_is_fully_covered() {
        let mask = coverage_mask(&[rect(2.0, 2.0, 5.0, 4.0)], 8, 8);
        for y in 0..8 {
            for x in 0..8 {
                let inside = (2..5).contains(&x) && (2..4).contains(&y);
                assert_eq!(mask[y * 8 + x], if inside { 1.0 } else { 0.0 }, "({x}, {y})");
            }
        }
    }

    #[test]
    fn half_pixel_edge_gives_half_coverage() {
        let mask = coverage_mask(&[rect(1.5, 0.0, 3.0, 1.0)], 4, 1);
        assert!((mask[1] - 0.5).abs() < 1e-6);
        assert_eq!(mask[2], 1.0);
    }

    #[test]
    fn area_matches_polygon_area() {
        let tri = vec![DVec2::new(1.0, 1.0), DVec2::new(9.0, 1.0), DVec2::new(1.0, 9.0)];
        let mask = coverage_mask(&[tri], 10, 10);
        assert!((total(&mask) - 32.0).abs() < 0.5);
    }

    #[test]
    fn circle_area_is_close_to_pi_r_squared() {
        let mask = coverage_mask(&[circle(DVec2::new(20.0, 20.0), 10.0)], 40, 40);
        let expected = std::f64::consts::PI * 100.0;
        assert!((total(&mask) - expected).abs() / expected < 0.02);
    }

    #[test]
    fn overlapping_oriented_contours_union() {
        let a = oriented(rect(0.0, 0.0, 4.0, 4.0));
        let mut b = rect(2.0, 0.0, 6.0, 4.0);
        b.reverse();
        let b = oriented(b);
        let mask = coverage_mask(&[a, b], 6, 4);
        assert!(mask.iter().all(|&c| c == 1.0));
    }

    #[test]
    fn opposite_windings_cancel() {
        let a = rect(0.0, 0.0, 4.0, 4.0);
        let mut b = rect(1.0, 1.0, 3.0, 3.0);
        b.reverse();
        let mask = coverage_mask(&[a, b], 4, 4);
        assert_eq!(mask[4 + 1], 0.0);
        assert_eq!(mask[0], 1.0);
    }

    #[test]
    fn shapes_outside_the_grid_are_clipped() {
        let mask = coverage_mask(&[rect(-10.0, -10.0, 2.0, 2.0)], 4, 4);
        assert_eq!(total(&mask), 4.0);
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let bad = vec![DVec2::new(0.0, 0.0), DVec2::new(f64::NAN, 3.0), DVec2::new(3.0, 3.0)];
        let mask = coverage_mask(&[bad], 4, 4);
        assert!(mask.iter().all(|c| c.is_finite()));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn coverage_is_within_unit_range(
                x0 in -5.0_f64..20.0, y0 in -5.0_f64..20.0,
                w in 0.1_f64..15.0, h in 0.1_f64..15.0,
            ) {
                let mask = coverage_mask(&[rect(x0, y0, x0 + w, y0 + h)], 16, 16);
                for &c in &mask {
                    prop_assert!((0.0..=1.0).contains(&c));
                }
                let clipped_w = (x0 + w).clamp(0.0, 16.0) - x0.clamp(0.0, 16.0);
                let clipped_h = (y0 + h).clamp(0.0, 16.0) - y0.clamp(0.0, 16.0);
                let expected = clipped_w.max(0.0) * clipped_h.max(0.0);
                prop_assert!((total(&mask) - expected).abs() <= 16.0 * 0.25 + 1e-6);
            }
        }
    }
}
