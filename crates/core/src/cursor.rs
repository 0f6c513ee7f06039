//! Pointer tracking with spring smoothing, presence fade and a decaying
//! trail of peaks left behind by fast motion.
//!
//! Positions are normalized to [0, 1] over the viewport. The spring is
//! integrated with semi-implicit Euler (velocity first, then position), the
//! same scheme as a critically-tuned UI spring.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::host::Subscription;

/// Tuning for [`CursorModel`]. Times are in milliseconds unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub spring_stiffness: f64,
    pub spring_damping: f64,
    pub trail_half_life_ms: f64,
    /// Pointer speed, in normalized units per millisecond, above which a
    /// trail peak may spawn.
    pub trail_speed_threshold: f64,
    pub trail_cooldown_ms: f64,
    pub max_trail: usize,
    /// Peaks below this amplitude are removed.
    pub trail_min_amp: f64,
    /// Presence fade rate, per second.
    pub presence_rate: f64,
    pub settle_position_eps: f64,
    pub settle_velocity_eps: f64,
    pub settle_presence_eps: f64,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            spring_stiffness: 140.0,
            spring_damping: 22.0,
            trail_half_life_ms: 380.0,
            trail_speed_threshold: 0.0028,
            trail_cooldown_ms: 90.0,
            max_trail: 6,
            trail_min_amp: 0.015,
            presence_rate: 7.0,
            settle_position_eps: 1e-8,
            settle_velocity_eps: 1e-8,
            settle_presence_eps: 0.005,
        }
    }
}

/// A decaying Gaussian source left where the pointer was moving fast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPeak {
    pub x: f64,
    pub y: f64,
    pub amp: f64,
}

/// Read-only view of the cursor for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorState<'a> {
    /// Last pointer sample, normalized.
    pub raw: DVec2,
    /// Spring-smoothed position, normalized.
    pub smoothed: DVec2,
    /// Spring velocity, normalized units per second.
    pub velocity: DVec2,
    /// Presence amplitude in [0, 1].
    pub amp: f64,
    pub present: bool,
    /// Live trail peaks, oldest first.
    pub trail: &'a [TrailPeak],
}

impl CursorState<'_> {
    /// Smoothed position in pixels for a `width x height` viewport.
    pub fn smoothed_px(&self, width: f64, height: f64) -> DVec2 {
        self.smoothed * DVec2::new(width, height)
    }
}

pub struct CursorModel {
    config: CursorConfig,
    viewport: DVec2,
    raw: DVec2,
    present: bool,
    amp: f64,
    position: DVec2,
    velocity: DVec2,
    trail: Vec<TrailPeak>,
    prev_sample: DVec2,
    prev_time: f64,
    last_spawn: f64,
    subscriptions: Vec<Subscription>,
}

impl CursorModel {
    /// A cursor at rest in the viewport center, absent.
    pub fn new(config: CursorConfig) -> Self {
        let center = DVec2::splat(0.5);
        Self {
            config,
            viewport: DVec2::ONE,
            raw: center,
            present: false,
            amp: 0.0,
            position: center,
            velocity: DVec2::ZERO,
            trail: Vec::with_capacity(config.max_trail),
            prev_sample: DVec2::ZERO,
            prev_time: 0.0,
            last_spawn: 0.0,
            subscriptions: Vec::new(),
        }
    }

    pub fn config(&self) -> &CursorConfig {
        &self.config
    }

    /// Sets the viewport used to normalize pointer coordinates. Non-positive
    /// sizes are treated as 1.
    pub fn resize(&mut self, width: f64, height: f64) {
        let guard = |v: f64| if v > 0.0 { v } else { 1.0 };
        self.viewport = DVec2::new(guard(width), guard(height));
    }

    /// Records a pointer sample at client coordinates and a millisecond
    /// timestamp, spawning a trail peak at the previous sample when the
    /// pointer moved fast enough.
    pub fn pointer_move(&mut self, client_x: f64, client_y: f64, timestamp_ms: f64) {
        let sample = DVec2::new(client_x, client_y) / self.viewport;
        let cfg = &self.config;

        if self.prev_time > 0.0 {
            let dt = timestamp_ms - self.prev_time;
            if dt > 0.0 {
                let speed = (sample - self.prev_sample).length() / dt;
                if speed > cfg.trail_speed_threshold
                    && self.trail.len() < cfg.max_trail
                    && timestamp_ms - self.last_spawn > cfg.trail_cooldown_ms
                {
                    self.trail.push(TrailPeak {
                        x: self.prev_sample.x,
                        y: self.prev_sample.y,
                        amp: 1.0,
                    });
                    self.last_spawn = timestamp_ms;
                }
            }
        }

        self.raw = sample;
        self.prev_sample = sample;
        self.prev_time = timestamp_ms;
        self.present = true;
    }

    pub fn pointer_leave(&mut self) {
        self.present = false;
    }

    fn presence_target(&self) -> f64 {
        if self.present {
            1.0
        } else {
            0.0
        }
    }

    /// Advances presence, spring and trail decay by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        let cfg = self.config;

        self.amp += (self.presence_target() - self.amp) * (1.0 - (-dt * cfg.presence_rate).exp());

        let accel = (self.raw - self.position) * cfg.spring_stiffness - self.velocity * cfg.spring_damping;
        self.velocity += accel * dt;
        self.position += self.velocity * dt;

        let decay = 0.5_f64.powf(dt * 1000.0 / cfg.trail_half_life_ms);
        self.trail.retain_mut(|peak| {
            peak.amp *= decay;
            peak.amp >= cfg.trail_min_amp
        });
    }

    pub fn state(&self) -> CursorState<'_> {
        CursorState {
            raw: self.raw,
            smoothed: self.position,
            velocity: self.velocity,
            amp: self.amp,
            present: self.present,
            trail: &self.trail,
        }
    }

    /// True when the spring has converged, no trail remains and presence has
    /// reached its target.
    pub fn is_settled(&self) -> bool {
        let cfg = &self.config;
        (self.position - self.raw).length_squared() < cfg.settle_position_eps
            && self.velocity.length_squared() < cfg.settle_velocity_eps
            && self.trail.is_empty()
            && (self.amp - self.presence_target()).abs() < cfg.settle_presence_eps
    }

    /// Takes ownership of an input registration feeding this cursor.
    pub fn attach(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn attached(&self) -> usize {
        self.subscriptions.len()
    }

    /// Releases every attached input registration.
    pub fn dispose(&mut self) {
        for mut sub in self.subscriptions.drain(..) {
            sub.cancel();
        }
    }
}

impl Default for CursorModel {
    fn default() -> Self {
        Self::new(CursorConfig::default())
    }
}

impl std::fmt::Debug for CursorModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorModel")
            .field("raw", &self.raw)
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("amp", &self.amp)
            .field("present", &self.present)
            .field("trail", &self.trail.len())
            .finish_non_exhaustive()
    }
}
