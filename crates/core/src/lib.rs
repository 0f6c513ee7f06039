#![deny(unsafe_code)]
//! Core of the backdrop generative background engine.
//!
//! Provides seeded gradient noise and FBM, scalar fields with Gaussian
//! deposition and normalization, the shared warped-FBM field pipeline,
//! marching-squares contours, the spring cursor model, the frame loop, the
//! `Surface`/`Host`/`Scene` seams, and the `Engine` that composes them.

pub mod color;
pub mod config;
pub mod contour;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod field;
pub mod frame_loop;
pub mod host;
pub mod noise;
pub mod params;
pub mod pipeline;
pub mod prng;
pub mod scene;
pub mod surface;

pub use color::Rgba;
pub use config::EngineConfig;
pub use contour::{draw_contours, extract_segments, ContourStyle, LevelFilter, SaddlePolicy, Segment};
pub use cursor::{CursorConfig, CursorModel, CursorState, TrailPeak};
pub use engine::Engine;
pub use error::BackdropError;
pub use field::ScalarField;
pub use frame_loop::{FrameLoop, Tick};
pub use host::{FrameHandle, FrameScheduler, HeadlessHost, Host, Subscription, TimerHandle, Viewport};
pub use noise::{Fbm, GradientNoise, PermutationTable};
pub use pipeline::{CursorInfluence, ProceduralField, WarpedFbmConfig};
pub use prng::Lcg32;
pub use scene::{Frame, Scene};
pub use surface::{LineCap, LineJoin, LinearGradient, Paint, RecordingSurface, Surface, TextBaseline};
