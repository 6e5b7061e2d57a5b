//! # SKYHOP Headless Runner
//!
//! Plays a scripted session without a window and logs what happened.
//!
//! ## Usage
//!
//! ```bash
//! skyhop-headless --config config/skyhop.toml --frames 1200
//! RUST_LOG=skyhop=debug skyhop-headless
//! ```

use std::process::ExitCode;

use skyhop::core::{OnGround, Position, Velocity};
use skyhop::{
    App, FrameCollector, GameResult, InputScript, Key, ProceduralModelLoader, SimulationConfig,
};
use tracing_subscriber::EnvFilter;

/// Simulated display rate.
const DISPLAY_HZ: f32 = 60.0;

struct Args {
    config: Option<String>,
    frames: u64,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        config: None,
        frames: 600,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--frames" | "-f" => {
                if i + 1 < args.len() {
                    parsed.frames = args[i + 1].parse().unwrap_or(parsed.frames);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: skyhop-headless [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>    Simulation config (default: built-in)");
                println!("  -f, --frames <NUM>     Frames to run at 60 Hz (default: 600)");
                println!("  -h, --help             Show this help");
                return None;
            }
            other => tracing::warn!(argument = other, "ignoring unknown argument"),
        }
        i += 1;
    }
    Some(parsed)
}

/// Run toward the first hop, jump, drift, turn, coast.
fn demo_script() -> InputScript {
    InputScript::new()
        .then(45, &[Key::Forward])
        .then(1, &[Key::Forward, Key::Jump])
        .then(40, &[Key::Forward])
        .then(30, &[Key::Left])
        .then(20, &[Key::Forward, Key::Right])
        .then(60, &[])
}

fn run(args: &Args) -> GameResult<()> {
    let config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    let mut app = App::new(config, Box::new(ProceduralModelLoader), FrameCollector::default())?;
    let script = demo_script();
    let period = script.len_frames().max(1);

    tracing::info!(frames = args.frames, entities = app.world().alive_count(), "headless session starting");

    for frame in 0..args.frames {
        let input = script.snapshot_at(frame % period);
        let stats = app.frame(1.0 / DISPLAY_HZ, &input)?;

        if stats.reset || frame % 120 == 0 {
            let world = app.world();
            let player = app.player();
            if let (Some(position), Some(velocity)) = (
                world.get_component::<Position>(player),
                world.get_component::<Velocity>(player),
            ) {
                tracing::debug!(
                    frame,
                    x = position.x,
                    y = position.y,
                    z = position.z,
                    speed = velocity.horizontal_speed(),
                    grounded = world.has_component::<OnGround>(player),
                    "player"
                );
            }
        }
    }

    app.stats().log_summary(app.config().timing.tick_seconds());
    tracing::info!(
        frames_presented = app.presenter().frames_presented(),
        cached_meshes = app.presenter().meshes().len(),
        "headless session finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(args) = parse_args() else {
        return ExitCode::SUCCESS;
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "headless session failed");
            ExitCode::FAILURE
        }
    }
}
