//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// line-telemetry - serial line telemetry acquisition
#[derive(Parser, Debug)]
#[command(
    name = "line-telemetry",
    author,
    version,
    about = "Serial line telemetry acquisition pipeline",
    long_about = "Reads the measurement device's serial output, parses its `data:` packets \n\
                  and appends every sample to a SQLite table. A built-in simulator \n\
                  reproduces the device output for development without hardware."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LINE_TELEMETRY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "LINE_TELEMETRY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest telemetry into the record store
    Run(RunArgs),

    /// Print simulated device output to stdout
    Simulate(SimulateArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Telemetry source selection
#[derive(Args, Debug, Clone)]
#[group(multiple = false)]
pub struct SourceArgs {
    /// Read from the built-in device simulator instead of a serial port
    #[arg(long)]
    pub simulate: bool,

    /// Replay a captured serial log instead of reading a port
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "LINE_TELEMETRY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Serial port to open (overrides configuration)
    #[arg(short, long, env = "LINE_TELEMETRY_PORT")]
    pub port: Option<String>,

    /// Baud rate (overrides configuration)
    #[arg(long, env = "LINE_TELEMETRY_BAUD")]
    pub baud: Option<u32>,

    /// Database file (overrides configuration)
    #[arg(long, env = "LINE_TELEMETRY_DB")]
    pub db: Option<PathBuf>,

    /// Reject out-of-domain raw/vout/short_circuit values
    #[arg(long)]
    pub strict: bool,

    /// Log records instead of writing the database
    #[arg(long)]
    pub dry_run: bool,

    /// Stop after this many persisted records (0 = unlimited)
    #[arg(long, env = "LINE_TELEMETRY_MAX_RECORDS")]
    pub max_records: Option<u64>,

    /// Simulator cycles before the stream ends (simulator source only)
    #[arg(long, requires = "simulate")]
    pub cycles: Option<u64>,

    /// Simulator RNG seed (overrides configuration)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pause between replayed chunks in milliseconds
    #[arg(long, requires = "replay")]
    pub replay_pace_ms: Option<u64>,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "LINE_TELEMETRY_TIMEOUT")]
    pub timeout: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "LINE_TELEMETRY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Path to configuration file; its [simulator] section is used
    #[arg(short, long, env = "LINE_TELEMETRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of cycles to print (default: until interrupted)
    #[arg(short = 'n', long)]
    pub cycles: Option<u64>,

    /// RNG seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Delay between cycles in milliseconds (overrides configuration)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Print only the `data:` packet lines
    #[arg(long)]
    pub packets_only: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "line-telemetry.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
