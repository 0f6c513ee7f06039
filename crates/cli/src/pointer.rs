//! Scripted pointer input for headless renders.
//!
//! Waypoints are CSS-pixel positions written `x,y`. Over a render of N
//! frames the pointer moves along the polyline through the waypoints at
//! constant parameter speed, reaching the last one on the final frame.

use crate::error::CliError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerPath {
    points: Vec<(f64, f64)>,
}

impl PointerPath {
    pub fn parse(specs: &[String]) -> Result<Self, CliError> {
        let points = specs
            .iter()
            .map(|s| parse_waypoint(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Pointer position on `frame` of `frames`, or `None` without waypoints.
    pub fn position(&self, frame: usize, frames: usize) -> Option<(f64, f64)> {
        let n = self.points.len();
        match n {
            0 => return None,
            1 => return Some(self.points[0]),
            _ => {}
        }
        if frames <= 1 {
            return Some(self.points[n - 1]);
        }
        let t = frame.min(frames - 1) as f64 / (frames - 1) as f64 * (n - 1) as f64;
        let i = (t.floor() as usize).min(n - 2);
        let frac = t - i as f64;
        let (ax, ay) = self.points[i];
        let (bx, by) = self.points[i + 1];
        Some((ax + (bx - ax) * frac, ay + (by - ay) * frac))
    }
}

fn parse_waypoint(spec: &str) -> Result<(f64, f64), CliError> {
    let bad = || CliError::Input(format!("invalid pointer waypoint {spec:?}, expected x,y"));
    let (x, y) = spec.split_once(',').ok_or_else(bad)?;
    let x: f64 = x.trim().parse().map_err(|_| bad())?;
    let y: f64 = y.trim().parse().map_err(|_| bad())?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(bad());
    }
    Ok((x, y))
}
