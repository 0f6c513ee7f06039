//! The environment the engine runs in: clock, frame scheduling, timers,
//! viewport metrics, and owned listener handles.
//!
//! The browser binding implements [`Host`] over `requestAnimationFrame` and
//! `setTimeout`; [`HeadlessHost`] is a manually driven clock used by tests
//! and the CLI.

use std::fmt;

/// CSS-pixel viewport size plus device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    /// A viewport with device pixel ratio 1.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_device_pixel_ratio(self, dpr: f64) -> Self {
        Self {
            device_pixel_ratio: dpr,
            ..self
        }
    }

    /// Ratio actually applied: non-finite or non-positive values become 1.
    pub fn effective_dpr(&self) -> f64 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }

    /// Backing-store size in device pixels: `round(W * dpr) x round(H * dpr)`.
    pub fn backing_size(&self) -> (u32, u32) {
        let dpr = self.effective_dpr();
        let px = |v: f64| (v.max(0.0) * dpr).round() as u32;
        (px(self.width), px(self.height))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Identifies one requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Identifies one pending timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Requests display-synchronized frame callbacks.
///
/// The callback itself is wired by the host: when a requested frame comes
/// due, the host calls back into whatever owns the loop with the frame
/// timestamp.
pub trait FrameScheduler {
    /// High-resolution monotonic time in milliseconds.
    fn now_ms(&self) -> f64;
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Everything the engine needs from its environment.
pub trait Host: FrameScheduler {
    fn set_timeout(&mut self, delay_ms: f64) -> TimerHandle;
    fn clear_timeout(&mut self, handle: TimerHandle);
    fn viewport(&self) -> Viewport;
}

/// An owned registration (event listener, input hook) released exactly once,
/// either explicitly with [`Subscription::cancel`] or when dropped.
#[must_use = "dropping a Subscription releases it immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Runs the release action if it has not run yet.
    pub fn cancel(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// A host with a manual clock. Frames and timers are queued and handed out
/// by the driver ([`HeadlessHost::take_frame`], [`HeadlessHost::take_due_timers`]).
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    now: f64,
    viewport: Viewport,
    next_id: u64,
    frames: Vec<FrameHandle>,
    timers: Vec<(TimerHandle, f64)>,
}

impl HeadlessHost {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            now: 0.0,
            viewport,
            next_id: 1,
            frames: Vec::new(),
            timers: Vec::new(),
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Moves the clock forward by `ms`.
    pub fn advance(&mut self, ms: f64) {
        self.now += ms.max(0.0);
    }

    pub fn set_now(&mut self, now_ms: f64) {
        self.now = now_ms;
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Removes and returns the oldest requested frame.
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        if self.frames.is_empty() {
            None
        } else {
            Some(self.frames.remove(0))
        }
    }

    /// Removes and returns every timer whose deadline has passed, in
    /// deadline order.
    pub fn take_due_timers(&mut self) -> Vec<TimerHandle> {
        let now = self.now;
        let mut due: Vec<(TimerHandle, f64)> = Vec::new();
        self.timers.retain(|&(handle, at)| {
            if at <= now {
                due.push((handle, at));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.1.total_cmp(&b.1));
        due.into_iter().map(|(handle, _)| handle).collect()
    }

    fn next_handle(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl FrameScheduler for HeadlessHost {
    fn now_ms(&self) -> f64 {
        self.now
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle());
        self.frames.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|&h| h != handle);
    }
}

impl Host for HeadlessHost {
    fn set_timeout(&mut self, delay_ms: f64) -> TimerHandle {
        let handle = TimerHandle(self.next_handle());
        self.timers.push((handle, self.now + delay_ms.max(0.0)));
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        self.timers.retain(|&(h, _)| h != handle);
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}
