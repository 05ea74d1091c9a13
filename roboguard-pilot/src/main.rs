// roboguard - perception and obstacle avoidance session runner
// Runs one timed session against the simulated robot

use anyhow::Context;
use clap::Parser;
use roboguard_core::Parameters;
use roboguard_pilot::{
    Hardware, ObstacleSide, Orchestrator, SimulatedCamera, SimulatedDrive, SimulatedRangeArray,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const OPEN_RANGE_MM: f64 = 1500.0;
const OBSTACLE_RANGE_MM: f64 = 120.0;

#[derive(Parser)]
#[command(name = "roboguard")]
#[command(about = "Colour-target tracking and obstacle avoidance for a wheeled robot")]
#[command(long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Session length in seconds
    #[arg(long, short)]
    duration: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Simulated camera sees the target colour
    #[arg(long)]
    target_in_view: bool,

    /// Simulated obstacle in front of one range sensor
    #[arg(long, value_enum)]
    obstacle: Option<ObstacleSide>,

    /// Print the session report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let mut params = match &cli.config {
        Some(path) => Parameters::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Parameters::default(),
    }
    .with_env_overrides();
    if let Some(secs) = cli.duration {
        params.session.run_duration_secs = secs;
    }

    let (width, height) = params.session.frame_resolution;
    let camera = SimulatedCamera::new(width, height).with_target(cli.target_in_view);
    let sensors = match cli.obstacle {
        Some(side) => SimulatedRangeArray::with_obstacle(side, OBSTACLE_RANGE_MM, OPEN_RANGE_MM),
        None => SimulatedRangeArray::clear(OPEN_RANGE_MM),
    };
    let hardware = Hardware {
        camera: Box::new(camera),
        sensors: Box::new(sensors),
        actuator: Box::new(SimulatedDrive::new()),
    };

    info!("Starting roboguard session");
    let orchestrator = Orchestrator::new(params, hardware)?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let report = orchestrator.run_until(shutdown).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!(
            "Frames: {} captured, {} evicted, {} processed, {} discarded, {} with target",
            report.frames_captured,
            report.frames_evicted,
            report.frames_processed,
            report.frames_discarded,
            report.detections
        );
        for (maneuver, count) in &report.navigation.maneuvers {
            info!("  {:?}: {}", maneuver, count);
        }
    }

    info!("roboguard session complete");
    Ok(())
}
