//! StrokeLab CLI — Command-line interface for pose archive analysis.
//!
//! Usage:
//!   strokelab detect <ARCHIVE>     Detect swings in a pose archive
//!   strokelab history <ARCHIVE>    Dump a joint metric series
//!   strokelab info <ARCHIVE>       Show archive information
//!   strokelab synth                Generate a synthetic archive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "strokelab",
    about = "Frame-accurate pose extraction and swing analysis",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect swings in a pose archive
    Detect {
        /// Path to the archive JSON file
        archive: PathBuf,

        /// Print events as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Zero-based index of the tracked person
        #[arg(long, default_value = "0")]
        person: usize,

        /// Smoothing window for the velocity series (samples)
        #[arg(long, default_value = "3")]
        smoothing_window: usize,

        /// Percentile of smoothed velocity used as peak threshold
        #[arg(long, default_value = "75.0")]
        percentile: f64,

        /// Non-maximum suppression window (seconds)
        #[arg(long, default_value = "1.25")]
        nms_window: f64,

        /// Minimum spacing between events (seconds)
        #[arg(long, default_value = "1.5")]
        min_distance: f64,

        /// Discard events below this fraction of the strongest event
        #[arg(long, default_value = "0.333")]
        min_ratio: f64,

        /// Disable the outward-direction filter
        #[arg(long)]
        no_direction_filter: bool,
    },

    /// Replay an archive through the stability filter and dump a metric series
    History {
        /// Path to the archive JSON file
        archive: PathBuf,

        /// Series kind: segment | angle | acceleration
        #[arg(long, default_value = "segment")]
        kind: String,

        /// Series name, e.g. left_forearm, right_elbow, left_wrist
        #[arg(long)]
        name: String,
    },

    /// Show archive information
    Info {
        /// Path to the archive JSON file
        archive: PathBuf,
    },

    /// Generate a synthetic swing archive for pipeline smoke tests
    Synth {
        /// Output archive path
        #[arg(short, long, default_value = "synth.json")]
        output: PathBuf,

        /// Clip duration in seconds
        #[arg(long, default_value = "10.0")]
        duration: f64,

        /// Frame rate
        #[arg(long, default_value = "30.0")]
        fps: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    strokelab_common::logging::init_logging(&strokelab_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Detect {
            archive,
            json,
            person,
            smoothing_window,
            percentile,
            nms_window,
            min_distance,
            min_ratio,
            no_direction_filter,
        } => commands::detect::run(
            archive,
            json,
            person,
            smoothing_window,
            percentile,
            nms_window,
            min_distance,
            min_ratio,
            !no_direction_filter,
        ),
        Commands::History {
            archive,
            kind,
            name,
        } => commands::history::run(archive, kind, name),
        Commands::Info { archive } => commands::info::run(archive),
        Commands::Synth {
            output,
            duration,
            fps,
        } => commands::synth::run(output, duration, fps).await,
    }
}
