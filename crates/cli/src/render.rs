//! Headless render driver: runs the engine against a [`HeadlessHost`] and a
//! [`Pixmap`], delivering frames and timers on a fixed clock.

use backdrop_core::{Engine, EngineConfig, FrameScheduler, HeadlessHost, Viewport};
use backdrop_raster::Pixmap;
use backdrop_scenes::SceneKind;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::CliError;
use crate::pointer::PointerPath;

/// One headless render request.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub scene: String,
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
    pub frames: usize,
    pub dt_ms: f64,
    pub params: Value,
    pub config: EngineConfig,
    pub pointer: PointerPath,
}

/// What the driver did, for the summary line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    /// Frames on which the scene actually ticked.
    pub ticks: usize,
    pub elapsed_ms: f64,
    pub settled: bool,
}

impl RenderJob {
    /// Loads the scene and delivers `frames` animation frames `dt_ms` apart.
    /// Returns the final pixmap.
    pub fn run(&self) -> Result<(Pixmap, RenderStats), CliError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(CliError::Input(format!(
                "canvas size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        let viewport = Viewport::new(self.width, self.height).with_device_pixel_ratio(self.dpr);
        let mut engine = Engine::new(Pixmap::default(), HeadlessHost::new(viewport), self.config);
        engine.load(SceneKind::boxed(&self.scene, &self.params)?)?;
        info!(scene = %self.scene, frames = self.frames, "rendering");

        let mut ticks = 0;
        for i in 0..self.frames {
            engine.host_mut().advance(self.dt_ms);
            let now = engine.host().now_ms();
            if let Some((x, y)) = self.pointer.position(i, self.frames) {
                engine.pointer_move(x, y, now);
            }
            for timer in engine.host_mut().take_due_timers() {
                engine.timer_fired(timer)?;
            }
            if engine.host_mut().take_frame().is_some() && engine.frame(now) {
                ticks += 1;
            }
        }

        let stats = RenderStats {
            ticks,
            elapsed_ms: engine.host().now_ms(),
            settled: engine.is_settled(),
        };
        debug!(?stats, "render finished");
        engine.destroy();
        let pixmap = engine.surface().clone();
        Ok((pixmap, stats))
    }
}
