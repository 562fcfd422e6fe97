//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Motion Recorder - motion-triggered recording for a video packet stream
#[derive(Parser, Debug)]
#[command(
    name = "motion-recorder",
    author,
    version,
    about = "Motion-triggered video recording pipeline",
    long_about = "Records a video packet stream only while it shows motion.\n\n\
                  Keeps a pre-roll buffer, merges motion flags from a detector, \n\
                  and hands each recorded segment to the configured sinks. \n\
                  Without a camera, a simulated stream follows [simulation]."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MOTION_RECORDER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (overrides [observability].log_format)
    #[arg(long, value_enum, global = true, env = "MOTION_RECORDER_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the recording pipeline on the simulated stream
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "recorder.toml",
        env = "MOTION_RECORDER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the stream name
    #[arg(long, env = "MOTION_RECORDER_STREAM")]
    pub stream: Option<String>,

    /// Override motion.prerecord_secs
    #[arg(long)]
    pub prerecord: Option<u64>,

    /// Override motion.postrecord_secs
    #[arg(long)]
    pub postrecord: Option<u64>,

    /// Override motion.threshold_percent
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Override motion.analysis_window (pts units)
    #[arg(long)]
    pub window: Option<i64>,

    /// Override simulation.duration_secs (0 = until interrupted)
    #[arg(long, env = "MOTION_RECORDER_DURATION")]
    pub duration: Option<u64>,

    /// Stream seconds simulated per wall-clock second
    #[arg(long, default_value = "1.0", env = "MOTION_RECORDER_SPEED")]
    pub speed: f64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "MOTION_RECORDER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Capacity of the queue between the engine and the dispatcher
    #[arg(long, default_value = "64", env = "MOTION_RECORDER_QUEUE_SIZE")]
    pub queue_size: usize,

    /// Metrics server port (overrides [observability].metrics_port)
    #[arg(long, env = "MOTION_RECORDER_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "recorder.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "recorder.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the simulated motion schedule
    #[arg(long)]
    pub schedule: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
