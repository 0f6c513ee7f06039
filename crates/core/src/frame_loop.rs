//! Frame-driven animation loop that runs only while its target is unsettled.
//!
//! The loop owns no target: each delivered frame borrows it mutably, so the
//! tick callback and the settled predicate can both see the same state
//! without shared ownership.

use tracing::{debug, trace};

use crate::host::{FrameHandle, FrameScheduler};

/// Default ceiling on one frame step, in seconds.
pub const DEFAULT_MAX_STEP: f64 = 0.05;

/// One delivered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Seconds since the previous frame, clamped to `[0, max_step]`.
    pub dt: f64,
    pub timestamp_ms: f64,
}

type TickFn<T> = Box<dyn FnMut(&mut T, Tick)>;
type SettledFn<T> = Box<dyn Fn(&T) -> bool>;

pub struct FrameLoop<T> {
    on_tick: TickFn<T>,
    is_settled: SettledFn<T>,
    max_step: f64,
    pending: Option<FrameHandle>,
    last_time: f64,
}

impl<T> FrameLoop<T> {
    pub fn new(
        on_tick: impl FnMut(&mut T, Tick) + 'static,
        is_settled: impl Fn(&T) -> bool + 'static,
        max_step: f64,
    ) -> Self {
        Self {
            on_tick: Box::new(on_tick),
            is_settled: Box::new(is_settled),
            max_step: max_step.max(0.0),
            pending: None,
            last_time: 0.0,
        }
    }

    /// Whether a frame is pending.
    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    /// Requests a frame unless one is already pending.
    pub fn start<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if self.pending.is_some() {
            return;
        }
        self.last_time = scheduler.now_ms();
        self.pending = Some(scheduler.request_frame());
        debug!(at_ms = self.last_time, "animation loop started");
    }

    /// Cancels the pending frame, if any.
    pub fn stop<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
            debug!("animation loop stopped");
        }
    }

    /// Delivers a frame at `timestamp_ms`. Ignored when no frame is pending.
    ///
    /// Re-requests the next frame only if the target is not settled; returns
    /// whether a tick ran.
    pub fn on_frame<S: FrameScheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        target: &mut T,
        timestamp_ms: f64,
    ) -> bool {
        if self.pending.take().is_none() {
            return false;
        }
        let dt = ((timestamp_ms - self.last_time) / 1000.0).clamp(0.0, self.max_step);
        self.last_time = timestamp_ms;
        trace!(dt, timestamp_ms, "frame");

        (self.on_tick)(target, Tick { dt, timestamp_ms });

        if (self.is_settled)(target) {
            debug!(at_ms = timestamp_ms, "animation loop idle");
        } else {
            self.pending = Some(scheduler.request_frame());
        }
        true
    }
}

impl<T> std::fmt::Debug for FrameLoop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("max_step", &self.max_step)
            .field("pending", &self.pending)
            .field("last_time", &self.last_time)
            .finish_non_exhaustive()
    }
}
