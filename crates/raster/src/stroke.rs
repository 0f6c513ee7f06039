//! Stroke outlining: dashes, segment quads, caps and joins, all in device
//! pixels. Every emitted contour is oriented the same way so the pieces
//! union under the nonzero rule.

use backdrop_core::{LineCap, LineJoin};
use glam::DVec2;

use crate::raster::{circle, oriented, Contour};

/// Below this device width round caps and joins are skipped; they would be
/// smaller than a pixel.
const MIN_DECORATED_WIDTH: f64 = 1.0;

/// An open or closed polyline in device pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<DVec2>,
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
}

/// The dash pattern as the canvas interprets it: odd-length patterns are
/// repeated once, and patterns with a negative, non-finite or all-zero entry
/// disable dashing.
pub fn normalize_dash(pattern: &[f64]) -> Vec<f64> {
    if pattern.iter().any(|v| !v.is_finite() || *v < 0.0) || pattern.iter().all(|v| *v == 0.0) {
        return Vec::new();
    }
    let mut out = pattern.to_vec();
    if out.len() % 2 == 1 {
        out.extend_from_slice(pattern);
    }
    out
}

/// Splits `line` into the "on" pieces of `pattern`. The pattern restarts at
/// each polyline.
pub fn apply_dash(line: &Polyline, pattern: &[f64]) -> Vec<Polyline> {
    let mut points = line.points.clone();
    if line.closed && points.len() > 1 {
        points.push(points[0]);
    }
    if pattern.is_empty() {
        return vec![Polyline {
            points,
            closed: line.closed,
        }];
    }

    let mut out = Vec::new();
    let mut idx = 0;
    let mut remaining = pattern[0];
    let mut current: Vec<DVec2> = points.first().copied().into_iter().collect();

    for pair in points.windows(2) {
        let (mut a, b) = (pair[0], pair[1]);
        let mut seg_len = a.distance(b);
        while seg_len > 0.0 {
            let on = idx % 2 == 0;
            let step = remaining.min(seg_len);
            let p = a + (b - a) * (step / seg_len);
            if on {
                current.push(p);
            }
            seg_len -= step;
            remaining -= step;
            a = p;
            if remaining <= 0.0 {
                if on && current.len() > 1 {
                    out.push(Polyline {
                        points: std::mem::take(&mut current),
                        closed: false,
                    });
                }
                current.clear();
                idx = (idx + 1) % pattern.len();
                remaining = pattern[idx];
                if idx % 2 == 0 {
                    current.push(a);
                }
            }
        }
    }
    if idx % 2 == 0 && current.len() > 1 {
        out.push(Polyline {
            points: current,
            closed: false,
        });
    }
    out
}

/// Outline contours of `line` stroked with `style`.
pub fn outline(line: &Polyline, style: &StrokeStyle, out: &mut Vec<Contour>) {
    let hw = style.width / 2.0;
    if hw <= 0.0 || !hw.is_finite() {
        return;
    }
    let mut pts: Vec<DVec2> = Vec::with_capacity(line.points.len());
    for &p in &line.points {
        if pts.last().map_or(true, |&q: &DVec2| q.distance_squared(p) > 1e-18) {
            pts.push(p);
        }
    }
    if line.closed && pts.len() > 2 && pts[0].distance_squared(pts[pts.len() - 1]) > 1e-18 {
        pts.push(pts[0]);
    }
    if pts.len() < 2 {
        return;
    }
    let decorate = style.width >= MIN_DECORATED_WIDTH;
    let last = pts.len() - 1;

    for (i, pair) in pts.windows(2).enumerate() {
        let (mut a, mut b) = (pair[0], pair[1]);
        let dir = (b - a).normalize();
        if style.cap == LineCap::Square && !line.closed {
            if i == 0 {
                a -= dir * hw;
            }
            if i + 1 == last {
                b += dir * hw;
            }
        }
        let n = dir.perp() * hw;
        out.push(oriented(vec![a + n, b + n, b - n, a - n]));
    }

    if !decorate {
        return;
    }
    if style.cap == LineCap::Round && !line.closed {
        out.push(circle(pts[0], hw));
        out.push(circle(pts[last], hw));
    }
    let joints = if line.closed { 0..last } else { 1..last };
    for j in joints {
        let p = pts[j];
        let prev = if j == 0 { pts[last - 1] } else { pts[j - 1] };
        let next = pts[j + 1];
        match style.join {
            LineJoin::Round => out.push(circle(p, hw)),
            LineJoin::Miter | LineJoin::Bevel => {
                let n1 = (p - prev).normalize().perp() * hw;
                let n2 = (next - p).normalize().perp() * hw;
                out.push(oriented(vec![p, p + n1, p + n2]));
                out.push(oriented(vec![p, p - n1, p - n2]));
            }
        }
    }
}
