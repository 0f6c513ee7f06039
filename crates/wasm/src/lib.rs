#![deny(unsafe_code)]
//! WASM bindings for the backdrop engine.
//!
//! `BackgroundEngine` owns an [`Engine`] over a [`CanvasSurface`] and a
//! [`BrowserHost`]. The engine lives in an `Rc<RefCell<..>>`; every browser
//! callback (animation frame, debounce timer, pointer and resize listeners)
//! holds only a `Weak` to it, and every listener is an owned
//! [`Subscription`] released by `destroy`.

mod canvas;
mod host;
mod listener;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use backdrop_core::{BackdropError, Engine, EngineConfig, FrameScheduler, TimerHandle};
use backdrop_scenes::SceneKind;
use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlCanvasElement, MouseEvent};

pub use canvas::CanvasSurface;
pub use host::{BrowserHost, Dispatch};

type WebEngine = Engine<CanvasSurface, BrowserHost>;
type Shared = Rc<RefCell<WebEngine>>;

fn to_js(e: BackdropError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn install_panic_hook() {
    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let global = js_sys::global();
            if let Ok(console) = Reflect::get(&global, &"console".into()) {
                if let Ok(error) = Reflect::get(&console, &"error".into()) {
                    if let Ok(f) = error.dyn_into::<js_sys::Function>() {
                        let _ = f.call1(&console, &JsValue::from_str(&format!("{info}")));
                    }
                }
            }
        }));
    });
}

/// Delivers host callbacks to the engine if it is still alive.
struct EngineDispatch {
    engine: Weak<RefCell<WebEngine>>,
}

impl Dispatch for EngineDispatch {
    fn frame(&self, timestamp_ms: f64) {
        if let Some(engine) = self.engine.upgrade() {
            engine.borrow_mut().frame(timestamp_ms);
        }
    }

    fn timer(&self, handle: TimerHandle) {
        let Some(engine) = self.engine.upgrade() else {
            return;
        };
        let mut engine = engine.borrow_mut();
        if let Err(e) = engine.timer_fired(handle) {
            tracing::warn!(error = %e, "rebuild after resize failed");
        }
        engine.host_mut().retire_timer(handle);
    }
}

/// Runs `f` on the engine behind `weak` unless it is gone or busy.
fn with_engine(weak: &Weak<RefCell<WebEngine>>, f: impl FnOnce(&mut WebEngine)) {
    if let Some(engine) = weak.upgrade() {
        if let Ok(mut engine) = engine.try_borrow_mut() {
            f(&mut engine);
        }
    }
}

/// A cursor-reactive generative background drawn into a canvas.
#[wasm_bindgen]
pub struct BackgroundEngine {
    engine: Shared,
}

#[wasm_bindgen]
impl BackgroundEngine {
    /// Wraps `canvas`, sizing it to the window. `config` is an optional
    /// engine configuration JSON document.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: Option<String>) -> Result<BackgroundEngine, JsValue> {
        install_panic_hook();
        let window = web_sys::window().ok_or_else(|| to_js(BackdropError::SurfaceUnavailable("no window".into())))?;
        let document = window
            .document()
            .ok_or_else(|| to_js(BackdropError::SurfaceUnavailable("no document".into())))?;
        let config = match config {
            Some(json) => EngineConfig::from_json_str(&json).map_err(to_js)?,
            None => EngineConfig::default(),
        };

        let surface = CanvasSurface::new(canvas).map_err(to_js)?;
        let engine: Shared = Rc::new(RefCell::new(Engine::new(
            surface,
            BrowserHost::new(window.clone()),
            config,
        )));
        let weak = Rc::downgrade(&engine);
        engine
            .borrow()
            .host()
            .set_dispatch(Rc::new(EngineDispatch { engine: weak.clone() }));

        let on_move = {
            let weak = weak.clone();
            listener::listen(&window, "mousemove", move |event: Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                let (x, y) = (f64::from(event.client_x()), f64::from(event.client_y()));
                with_engine(&weak, |e| {
                    let now = e.host().now_ms();
                    e.pointer_move(x, y, now);
                });
            })?
        };
        let on_leave = {
            let weak = weak.clone();
            listener::listen(&document, "mouseleave", move |_| {
                with_engine(&weak, |e| e.pointer_leave());
            })?
        };
        let on_resize = listener::listen(&window, "resize", move |_| {
            with_engine(&weak, |e| e.request_resize());
        })?;

        {
            let mut e = engine.borrow_mut();
            e.cursor_mut().attach(on_move);
            e.cursor_mut().attach(on_leave);
            e.attach_resize_listener(on_resize);
        }
        tracing::debug!("background engine created");
        Ok(BackgroundEngine { engine })
    }

    /// Replaces the active scene. `params` is an optional JSON object of
    /// scene parameters.
    pub fn load(&self, name: &str, params: Option<String>) -> Result<(), JsValue> {
        let params = match params {
            Some(json) => serde_json::from_str(&json).map_err(|e| JsValue::from_str(&format!("invalid params: {e}")))?,
            None => serde_json::Value::Object(Default::default()),
        };
        let scene = SceneKind::boxed(name, &params).map_err(to_js)?;
        self.engine.borrow_mut().load(scene).map_err(to_js)
    }

    /// Names accepted by [`BackgroundEngine::load`].
    pub fn scenes() -> Vec<String> {
        SceneKind::list_scenes().iter().map(|s| s.to_string()).collect()
    }

    /// Parameter schema of a scene as a JSON string.
    #[wasm_bindgen(js_name = paramSchema)]
    pub fn param_schema(name: &str) -> Result<String, JsValue> {
        use backdrop_core::Scene;
        let scene = SceneKind::from_name(name, &serde_json::Value::Null).map_err(to_js)?;
        Ok(scene.param_schema().to_string())
    }

    /// Stops the loop and releases every listener and timer. Safe to call
    /// more than once.
    pub fn destroy(&self) {
        let mut engine = self.engine.borrow_mut();
        engine.destroy();
        engine.host().clear_dispatch();
    }
}
