//! The background engine: owns the surface, cursor, animation loop and the
//! active scene, and wires viewport and pointer events into them.
//!
//! The engine is driven from outside. The host delivers frames to
//! [`Engine::frame`], timers to [`Engine::timer_fired`], and pointer events to
//! [`Engine::pointer_move`] / [`Engine::pointer_leave`]. Nothing here blocks or
//! spawns; every call returns after at most one synchronous render.

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::cursor::CursorModel;
use crate::error::BackdropError;
use crate::frame_loop::{FrameLoop, Tick};
use crate::host::{Host, Subscription, TimerHandle};
use crate::scene::{Frame, Scene};
use crate::surface::Surface;

/// The state a frame tick mutates: everything except the loop and host.
struct Stage<S> {
    surface: S,
    cursor: CursorModel,
    scene: Option<Box<dyn Scene>>,
    width: f64,
    height: f64,
    cols: usize,
    rows: usize,
    built_at_ms: f64,
}

impl<S: Surface> Stage<S> {
    /// Clears the viewport and renders the scene at `now_ms`.
    fn render(&mut self, now_ms: f64) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        self.surface.clear_rect(0.0, 0.0, self.width, self.height);
        let frame = Frame {
            cursor: self.cursor.state(),
            width: self.width,
            height: self.height,
            elapsed: ((now_ms - self.built_at_ms) / 1000.0).max(0.0),
        };
        scene.render(&mut self.surface, &frame);
    }

    fn tick(&mut self, tick: Tick) {
        self.cursor.tick(tick.dt);
        self.render(tick.timestamp_ms);
    }

    fn is_settled(&self) -> bool {
        self.cursor.is_settled() && self.scene.as_ref().map_or(true, |s| s.is_settled())
    }

    /// Sizes the grid for the current scene and builds it.
    fn build_scene(&mut self, padding: usize, now_ms: f64) -> Result<(), BackdropError> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        let cell = scene.cell_size();
        if cell.is_nan() || cell <= 0.0 {
            return Err(BackdropError::InvalidDimensions);
        }
        self.cols = ((self.width / cell).ceil() as usize).saturating_add(padding);
        self.rows = ((self.height / cell).ceil() as usize).saturating_add(padding);
        scene.build(self.cols, self.rows)?;
        self.built_at_ms = now_ms;
        Ok(())
    }

    /// Builds the scene, dropping it on failure so no half-built scene is
    /// ever rendered.
    fn build_or_unload(&mut self, padding: usize, now_ms: f64) -> Result<(), BackdropError> {
        let built = self.build_scene(padding, now_ms);
        if built.is_err() {
            if let Some(mut scene) = self.scene.take() {
                scene.dispose();
            }
        }
        built
    }
}

pub struct Engine<S, H> {
    config: EngineConfig,
    host: H,
    stage: Stage<S>,
    frame_loop: FrameLoop<Stage<S>>,
    resize_timer: Option<TimerHandle>,
    resize_listener: Option<Subscription>,
    destroyed: bool,
}

impl<S: Surface + 'static, H: Host> Engine<S, H> {
    /// Creates an engine and sizes `surface` to the host viewport.
    pub fn new(surface: S, host: H, config: EngineConfig) -> Self {
        let frame_loop = FrameLoop::new(
            |stage: &mut Stage<S>, tick: Tick| stage.tick(tick),
            |stage: &Stage<S>| stage.is_settled(),
            config.max_frame_step,
        );
        let mut engine = Self {
            stage: Stage {
                surface,
                cursor: CursorModel::new(config.cursor),
                scene: None,
                width: 0.0,
                height: 0.0,
                cols: 0,
                rows: 0,
                built_at_ms: 0.0,
            },
            config,
            host,
            frame_loop,
            resize_timer: None,
            resize_listener: None,
            destroyed: false,
        };
        engine.resize_surface();
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn surface(&self) -> &S {
        &self.stage.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.stage.surface
    }

    pub fn cursor(&self) -> &CursorModel {
        &self.stage.cursor
    }

    /// Mutable cursor access, e.g. to [`CursorModel::attach`] input
    /// subscriptions.
    pub fn cursor_mut(&mut self) -> &mut CursorModel {
        &mut self.stage.cursor
    }

    pub fn scene(&self) -> Option<&dyn Scene> {
        self.stage.scene.as_deref()
    }

    /// Viewport size in CSS pixels.
    pub fn size(&self) -> (f64, f64) {
        (self.stage.width, self.stage.height)
    }

    /// Current grid `(cols, rows)`; `(0, 0)` before the first load.
    pub fn grid(&self) -> (usize, usize) {
        (self.stage.cols, self.stage.rows)
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.is_running()
    }

    pub fn is_settled(&self) -> bool {
        self.stage.is_settled()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn resize_surface(&mut self) {
        let vp = self.host.viewport();
        let (bw, bh) = vp.backing_size();
        self.stage.width = vp.width.max(0.0);
        self.stage.height = vp.height.max(0.0);
        self.stage.surface.resize(bw, bh);
        self.stage.surface.set_scale(vp.effective_dpr());
        self.stage.cursor.resize(self.stage.width, self.stage.height);
        debug!(
            width = self.stage.width,
            height = self.stage.height,
            dpr = vp.effective_dpr(),
            "surface resized"
        );
    }

    /// Replaces the active scene: stops the loop, disposes the previous
    /// scene, builds the new one, renders it once and starts the loop unless
    /// the scene reports itself settled. On error no scene is active.
    pub fn load(&mut self, scene: Box<dyn Scene>) -> Result<(), BackdropError> {
        self.frame_loop.stop(&mut self.host);
        if let Some(mut previous) = self.stage.scene.take() {
            previous.dispose();
        }
        let settled = scene.is_settled();
        let name = scene.name();
        self.stage.scene = Some(scene);

        let now = self.host.now_ms();
        self.stage.build_or_unload(self.config.cell_padding, now)?;
        self.stage.render(now);
        debug!(scene = name, cols = self.stage.cols, rows = self.stage.rows, "scene loaded");

        if !settled {
            self.frame_loop.start(&mut self.host);
        }
        Ok(())
    }

    /// Forwards a pointer sample (client pixels, milliseconds) to the cursor
    /// and wakes the loop.
    pub fn pointer_move(&mut self, client_x: f64, client_y: f64, timestamp_ms: f64) {
        if self.destroyed {
            return;
        }
        self.stage.cursor.pointer_move(client_x, client_y, timestamp_ms);
        self.frame_loop.start(&mut self.host);
    }

    pub fn pointer_leave(&mut self) {
        if self.destroyed {
            return;
        }
        self.stage.cursor.pointer_leave();
        self.frame_loop.start(&mut self.host);
    }

    /// Schedules a rebuild after the debounce period; a newer request
    /// replaces a pending one.
    pub fn request_resize(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(pending) = self.resize_timer.take() {
            self.host.clear_timeout(pending);
        }
        self.resize_timer = Some(self.host.set_timeout(self.config.resize_debounce_ms));
        trace!("resize debounced");
    }

    /// Handles a host timer. Returns `Ok(true)` if it was the resize
    /// debounce timer and the engine resized.
    pub fn timer_fired(&mut self, handle: TimerHandle) -> Result<bool, BackdropError> {
        if self.resize_timer != Some(handle) {
            return Ok(false);
        }
        self.resize_timer = None;
        self.frame_loop.stop(&mut self.host);
        self.resize_surface();

        let now = self.host.now_ms();
        self.stage.build_or_unload(self.config.cell_padding, now)?;
        self.stage.render(now);

        // Keep animating after a rebuild; pointer activity is not needed to resume.
        if !self.stage.is_settled() {
            self.frame_loop.start(&mut self.host);
        }
        Ok(true)
    }

    /// Delivers an animation frame at `timestamp_ms`. Returns whether a tick
    /// ran.
    pub fn frame(&mut self, timestamp_ms: f64) -> bool {
        self.frame_loop
            .on_frame(&mut self.host, &mut self.stage, timestamp_ms)
    }

    /// Takes ownership of the viewport resize registration; it is released by
    /// [`Engine::destroy`].
    pub fn attach_resize_listener(&mut self, subscription: Subscription) {
        self.resize_listener = Some(subscription);
    }

    /// Stops the loop, releases every listener and the pending resize timer,
    /// and disposes the scene. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.frame_loop.stop(&mut self.host);
        self.stage.cursor.dispose();
        if let Some(mut listener) = self.resize_listener.take() {
            listener.cancel();
        }
        if let Some(timer) = self.resize_timer.take() {
            self.host.clear_timeout(timer);
        }
        if let Some(mut scene) = self.stage.scene.take() {
            scene.dispose();
        }
        self.destroyed = true;
        debug!("engine destroyed");
    }
}

impl<S, H> std::fmt::Debug for Engine<S, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("scene", &self.stage.scene.as_ref().map(|s| s.name()))
            .field("size", &(self.stage.width, self.stage.height))
            .field("grid", &(self.stage.cols, self.stage.rows))
            .field("running", &self.frame_loop.is_running())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
