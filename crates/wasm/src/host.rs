//! [`BrowserHost`]: `requestAnimationFrame`, `setTimeout` and the window
//! viewport behind the core [`Host`] trait.
//!
//! The host does not own the engine. Frame and timer callbacks go through
//! [`Dispatch`], which the binding points at the engine with a `Weak`
//! reference so a destroyed engine is never kept alive by a pending callback.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use backdrop_core::{FrameHandle, FrameScheduler, Host, TimerHandle, Viewport};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Window;

/// Where browser callbacks are delivered.
pub trait Dispatch {
    fn frame(&self, timestamp_ms: f64);
    fn timer(&self, handle: TimerHandle);
}

type Target = Rc<RefCell<Option<Rc<dyn Dispatch>>>>;

pub struct BrowserHost {
    window: Window,
    target: Target,
    on_frame: Closure<dyn FnMut(f64)>,
    pending_frame: Option<i32>,
    next_timer: u64,
    timers: HashMap<u64, (i32, Closure<dyn FnMut()>)>,
    // Closures of timers that already fired. They cannot be dropped while
    // their own callback is on the stack.
    spent: Vec<Closure<dyn FnMut()>>,
}

impl BrowserHost {
    pub fn new(window: Window) -> Self {
        let target: Target = Rc::new(RefCell::new(None));
        let frame_target = Rc::clone(&target);
        let on_frame = Closure::<dyn FnMut(f64)>::new(move |ts: f64| {
            let dispatch = frame_target.borrow().clone();
            if let Some(dispatch) = dispatch {
                dispatch.frame(ts);
            }
        });
        Self {
            window,
            target,
            on_frame,
            pending_frame: None,
            next_timer: 1,
            timers: HashMap::new(),
            spent: Vec::new(),
        }
    }

    /// Routes subsequent frame and timer callbacks to `dispatch`.
    pub fn set_dispatch(&self, dispatch: Rc<dyn Dispatch>) {
        *self.target.borrow_mut() = Some(dispatch);
    }

    /// Stops routing callbacks; later ones are dropped.
    pub fn clear_dispatch(&self) {
        self.target.borrow_mut().take();
    }

    /// Called by the dispatcher once a timer has fired.
    pub fn retire_timer(&mut self, handle: TimerHandle) {
        if let Some((_, closure)) = self.timers.remove(&handle.0) {
            self.spent.push(closure);
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Whether an animation frame request may still fire.
    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for BrowserHost {
    // The browser must not call into closures owned by a dropped host.
    fn drop(&mut self) {
        self.clear_dispatch();
        if let Some(id) = self.pending_frame.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        for (_, (id, _closure)) in self.timers.drain() {
            self.window.clear_timeout_with_handle(id);
        }
    }
}

impl FrameScheduler for BrowserHost {
    fn now_ms(&self) -> f64 {
        self.window.performance().map_or(0.0, |p| p.now())
    }

    fn request_frame(&mut self) -> FrameHandle {
        match self
            .window
            .request_animation_frame(self.on_frame.as_ref().unchecked_ref())
        {
            Ok(id) => {
                self.pending_frame = Some(id);
                FrameHandle(id as u64)
            }
            Err(e) => {
                tracing::warn!(error = ?e, "requestAnimationFrame failed");
                FrameHandle(0)
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let _ = self.window.cancel_animation_frame(handle.0 as i32);
        if self.pending_frame == Some(handle.0 as i32) {
            self.pending_frame = None;
        }
    }
}

impl Host for BrowserHost {
    fn set_timeout(&mut self, delay_ms: f64) -> TimerHandle {
        self.spent.clear();
        let handle = TimerHandle(self.next_timer);
        self.next_timer += 1;

        let target = Rc::clone(&self.target);
        let closure = Closure::<dyn FnMut()>::new(move || {
            let dispatch = target.borrow().clone();
            if let Some(dispatch) = dispatch {
                dispatch.timer(handle);
            }
        });
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay_ms.max(0.0).round() as i32,
            ) {
            Ok(id) => {
                self.timers.insert(handle.0, (id, closure));
            }
            Err(e) => tracing::warn!(error = ?e, "setTimeout failed"),
        }
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        if let Some((id, closure)) = self.timers.remove(&handle.0) {
            self.window.clear_timeout_with_handle(id);
            drop(closure);
        }
    }

    fn viewport(&self) -> Viewport {
        let dimension = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
        };
        Viewport::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
        .with_device_pixel_ratio(self.window.device_pixel_ratio())
    }
}
