//! phasetrack - flight phase segmentation
//!
//! Lists the recent flights of one aircraft, cuts each altitude track into
//! taxi-out / takeoff / cruise / landing / taxi-in intervals and stores them.
//!
//! # Usage
//!
//! ```bash
//! # OpenSky by ICAO24 hex address (anonymous access)
//! phasetrack 39856a
//!
//! # Flightradar24 by registration
//! FR24_API_KEY=... phasetrack F-GSQA --source flightradar24
//!
//! # Offline run from a replay file, nothing written to disk
//! phasetrack F-GSQA --replay flights.json --memory
//! ```
//!
//! # Environment Variables
//!
//! - `PHASETRACK_CONFIG`: Path to the TOML config (default: ./phasetrack.toml)
//! - `FR24_API_KEY`: Flightradar24 token (required for `--source flightradar24`)
//! - `OPENSKY_USERNAME` / `OPENSKY_PASSWORD`: optional OpenSky login
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};

use phasetrack::acquisition::build_sources;
use phasetrack::config::{AppConfig, Credentials, SourceKind, StorageBackend};
use phasetrack::pipeline::{BatchRunner, FlightProcessor};
use phasetrack::segmentation::PhaseSegmenter;
use phasetrack::storage::open_sink;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "phasetrack")]
#[command(about = "Segment an aircraft's recent flights into flight phases")]
#[command(version)]
struct CliArgs {
    /// Tail number (e.g. F-GSQA) or ICAO24 hex address (e.g. 39856a)
    aircraft: String,

    /// Config file to load; errors in it are fatal
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the data source (opensky, flightradar24, replay)
    #[arg(long, value_name = "KIND")]
    source: Option<SourceKind>,

    /// Read flights from a replay JSON file (implies --source replay)
    #[arg(long, value_name = "PATH")]
    replay: Option<PathBuf>,

    /// Keep phases in memory instead of the sled database
    #[arg(long)]
    memory: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

// ============================================================================
// Startup
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Config file (strict if given on the command line) plus CLI overrides.
fn resolve_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load(),
    };

    if let Some(kind) = args.source {
        config.source.kind = kind;
    }
    if let Some(path) = &args.replay {
        config.source.kind = SourceKind::Replay;
        config.replay.path = Some(path.clone());
    }
    if args.memory {
        config.storage.backend = StorageBackend::Memory;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run(args: CliArgs) -> Result<()> {
    let aircraft_id = args.aircraft.trim().to_string();
    if aircraft_id.is_empty() {
        bail!("Aircraft id must not be empty");
    }

    let config = resolve_config(&args)?;

    let credentials = Credentials::from_env().context("Invalid credentials")?;
    credentials
        .require_for(config.source.kind)
        .context("Missing credentials")?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  phasetrack - Flight Phase Segmentation");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Aircraft:     {}", aircraft_id);
    info!("  Source:       {}", config.source.kind);
    info!(
        "  Window:       {} point(s)",
        config.segmentation.confirmation_window
    );
    info!(
        "  Synthesis:    {}",
        if config.synthesis.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    info!("");

    let sources =
        build_sources(&config, &credentials).context("Failed to set up data sources")?;
    let sink = open_sink(&config.storage).context("Failed to open phase storage")?;

    let processor = FlightProcessor::new(
        PhaseSegmenter::new(config.segmentation.confirmation_window),
        config.synthesis.enabled,
    );
    let runner = BatchRunner::new(sources, sink, processor);

    let stats = runner.run(&aircraft_id).await;
    stats.log_summary(&aircraft_id);
    info!("{}", stats);

    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(args.json_logs);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
