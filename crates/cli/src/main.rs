#![deny(unsafe_code)]
//! CLI binary for the backdrop generative background engine.
//!
//! Subcommands:
//! - `render <scene>`: run a scene headlessly for N frames, write PNG
//! - `list`: print available scenes
//! - `describe <scene>`: print a scene's parameters and their schema

mod error;
mod pointer;
mod render;

use backdrop_core::{EngineConfig, Rgba, Scene};
use backdrop_scenes::SceneKind;
use clap::{Parser, Subcommand};
use error::CliError;
use pointer::PointerPath;
use render::RenderJob;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "backdrop", about = "Cursor-reactive generative background engine CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scene for N frames and write a PNG snapshot.
    Render {
        /// Scene name (e.g. "topographic").
        scene: String,

        /// Canvas width in CSS pixels.
        #[arg(short = 'W', long, default_value_t = 1280.0)]
        width: f64,

        /// Canvas height in CSS pixels.
        #[arg(short = 'H', long, default_value_t = 800.0)]
        height: f64,

        /// Device pixel ratio; the PNG is width*dpr by height*dpr.
        #[arg(long, default_value_t = 1.0)]
        dpr: f64,

        /// Number of animation frames to deliver.
        #[arg(short, long, default_value_t = 120)]
        frames: usize,

        /// Milliseconds between frames.
        #[arg(long, default_value_t = 16.0)]
        dt: f64,

        /// Pointer waypoint "x,y" in CSS pixels; repeat to script a path.
        #[arg(long = "pointer", value_name = "X,Y")]
        pointer: Vec<String>,

        /// Scene parameters as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Engine configuration JSON file (frame step, debounce, cursor tuning).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Background color the frame is flattened over.
        #[arg(long, default_value = "#000000")]
        background: String,

        /// Output file path.
        #[arg(short, long, default_value = "backdrop.png")]
        output: PathBuf,
    },
    /// List available scenes.
    List,
    /// Print a scene's effective parameters and parameter schema.
    Describe {
        /// Scene name.
        scene: String,

        /// Scene parameters as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

fn parse_params(params: &str) -> Result<serde_json::Value, CliError> {
    serde_json::from_str(params).map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig, CliError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("reading {}: {e}", path.display())))?;
    Ok(EngineConfig::from_json_str(&text)?)
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let scenes = SceneKind::list_scenes();
            if cli.json {
                let info = serde_json::json!({ "scenes": scenes });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Scenes:");
                for name in scenes {
                    println!("  {name}");
                }
            }
        }
        Command::Describe { scene, params } => {
            let kind = SceneKind::from_name(&scene, &parse_params(&params)?)?;
            let info = serde_json::json!({
                "scene": kind.name(),
                "cell_size": kind.cell_size(),
                "params": kind.params(),
                "schema": kind.param_schema(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Render {
            scene,
            width,
            height,
            dpr,
            frames,
            dt,
            pointer,
            params,
            config,
            background,
            output,
        } => {
            let job = RenderJob {
                scene: scene.clone(),
                width,
                height,
                dpr,
                frames,
                dt_ms: dt,
                params: parse_params(&params)?,
                config: load_config(config.as_ref())?,
                pointer: PointerPath::parse(&pointer)?,
            };
            let background = Rgba::from_hex(&background)?;

            let (pixmap, stats) = job.run()?;
            backdrop_raster::write_png(&pixmap, background, &output)?;

            if cli.json {
                let info = serde_json::json!({
                    "scene": scene,
                    "width": pixmap.width(),
                    "height": pixmap.height(),
                    "frames": frames,
                    "ticks": stats.ticks,
                    "elapsed_ms": stats.elapsed_ms,
                    "settled": stats.settled,
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {scene} ({}x{}, {frames} frames) -> {}",
                    pixmap.width(),
                    pixmap.height(),
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
