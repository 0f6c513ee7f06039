#![deny(unsafe_code)]
//! Scene registry: maps scene names to implementations.
//!
//! This crate sits between `backdrop-core` (which defines the `Scene` trait)
//! and the front ends. Both the CLI and the WASM bindings construct scenes
//! through [`SceneKind::from_name`] so the name table lives in one place.

pub mod ascii_terrain;
pub mod mech_hud;
pub mod topographic;
pub mod wireframe;

mod terrain;

use backdrop_core::{BackdropError, Frame, Scene, Surface};
use serde_json::Value;

pub use ascii_terrain::{AsciiTerrain, AsciiTerrainParams};
pub use mech_hud::{MechHud, MechHudParams};
pub use topographic::{Topographic, TopographicParams};
pub use wireframe::{Wireframe, WireframeParams};

/// All available scene names.
const SCENE_NAMES: &[&str] = &["topographic", "ascii-terrain", "wireframe", "mech-hud"];

/// Enumeration of all available scenes.
///
/// Wraps each scene and delegates `Scene` trait methods.
/// Use [`SceneKind::from_name`] for string-based construction (CLI, WASM).
#[derive(Debug, Clone)]
pub enum SceneKind {
    /// Contour map over warped FBM terrain.
    Topographic(Topographic),
    /// Character-ramp terrain with wind and cursor interference.
    AsciiTerrain(AsciiTerrain),
    /// Scrolling perspective wireframe.
    Wireframe(Wireframe),
    /// Layered cockpit overlay.
    MechHud(MechHud),
}

impl SceneKind {
    /// Constructs a scene by name.
    ///
    /// Returns `BackdropError::UnknownScene` if the name is not recognized.
    pub fn from_name(name: &str, params: &Value) -> Result<Self, BackdropError> {
        match name {
            "topographic" => Ok(SceneKind::Topographic(Topographic::from_json(params))),
            "ascii-terrain" => Ok(SceneKind::AsciiTerrain(AsciiTerrain::from_json(params))),
            "wireframe" => Ok(SceneKind::Wireframe(Wireframe::from_json(params))),
            "mech-hud" => Ok(SceneKind::MechHud(MechHud::from_json(params))),
            _ => Err(BackdropError::UnknownScene(name.to_string())),
        }
    }

    /// Returns a slice of all recognized scene names.
    pub fn list_scenes() -> &'static [&'static str] {
        SCENE_NAMES
    }

    /// Boxes the scene for [`backdrop_core::Engine::load`].
    pub fn boxed(name: &str, params: &Value) -> Result<Box<dyn Scene>, BackdropError> {
        Ok(Box::new(Self::from_name(name, params)?))
    }
}

impl Scene for SceneKind {
    fn name(&self) -> &'static str {
        match self {
            SceneKind::Topographic(s) => s.name(),
            SceneKind::AsciiTerrain(s) => s.name(),
            SceneKind::Wireframe(s) => s.name(),
            SceneKind::MechHud(s) => s.name(),
        }
    }

    fn cell_size(&self) -> f64 {
        match self {
            SceneKind::Topographic(s) => s.cell_size(),
            SceneKind::AsciiTerrain(s) => s.cell_size(),
            SceneKind::Wireframe(s) => s.cell_size(),
            SceneKind::MechHud(s) => s.cell_size(),
        }
    }

    fn build(&mut self, cols: usize, rows: usize) -> Result<(), BackdropError> {
        match self {
            SceneKind::Topographic(s) => s.build(cols, rows),
            SceneKind::AsciiTerrain(s) => s.build(cols, rows),
            SceneKind::Wireframe(s) => s.build(cols, rows),
            SceneKind::MechHud(s) => s.build(cols, rows),
        }
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &Frame<'_>) {
        match self {
            SceneKind::Topographic(s) => s.render(surface, frame),
            SceneKind::AsciiTerrain(s) => s.render(surface, frame),
            SceneKind::Wireframe(s) => s.render(surface, frame),
            SceneKind::MechHud(s) => s.render(surface, frame),
        }
    }

    fn is_settled(&self) -> bool {
        match self {
            SceneKind::Topographic(s) => s.is_settled(),
            SceneKind::AsciiTerrain(s) => s.is_settled(),
            SceneKind::Wireframe(s) => s.is_settled(),
            SceneKind::MechHud(s) => s.is_settled(),
        }
    }

    fn dispose(&mut self) {
        match self {
            SceneKind::Topographic(s) => s.dispose(),
            SceneKind::AsciiTerrain(s) => s.dispose(),
            SceneKind::Wireframe(s) => s.dispose(),
            SceneKind::MechHud(s) => s.dispose(),
        }
    }

    fn params(&self) -> Value {
        match self {
            SceneKind::Topographic(s) => s.params(),
            SceneKind::AsciiTerrain(s) => s.params(),
            SceneKind::Wireframe(s) => s.params(),
            SceneKind::MechHud(s) => s.params(),
        }
    }

    fn param_schema(&self) -> Value {
        match self {
            SceneKind::Topographic(s) => s.param_schema(),
            SceneKind::AsciiTerrain(s) => s.param_schema(),
            SceneKind::Wireframe(s) => s.param_schema(),
            SceneKind::MechHud(s) => s.param_schema(),
        }
    }
}
