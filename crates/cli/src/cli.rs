//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use reporter::SinkKind;
use std::path::PathBuf;

/// Telemetry Analyzer - field extraction and statistics over recorded logs
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-analyzer",
    author,
    version,
    about = "Extract and analyze scalar values from recorded telemetry logs",
    long_about = "Reads recorded telemetry logs, extracts values from the configured \n\
                  topics with per-task parse strings, runs the configured analysis \n\
                  strategies and writes the results to a report directory."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_ANALYZER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TELEMETRY_ANALYZER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the analysis tasks over one log file or a directory of logs
    Run(RunArgs),

    /// Validate and compile an analysis configuration without reading logs
    Validate(ValidateArgs),

    /// Display compiled tasks and, optionally, the topics of a log source
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Log file or directory of log files (*.jsonl, *.ndjson)
    pub source: PathBuf,

    /// Analysis configuration file (TOML or JSON)
    #[arg(env = "TELEMETRY_ANALYZER_CONFIG")]
    pub config: PathBuf,

    /// Parent directory of the timestamped result directory
    #[arg(
        short,
        long,
        default_value = "results",
        env = "TELEMETRY_ANALYZER_OUTPUT_DIR"
    )]
    pub output_dir: PathBuf,

    /// Number of log files read concurrently
    #[arg(long, default_value = "4", env = "TELEMETRY_ANALYZER_CONCURRENCY")]
    pub concurrency: usize,

    /// Report sinks to write
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "log,markdown,csv,json",
        env = "TELEMETRY_ANALYZER_SINKS"
    )]
    pub sinks: Vec<SinkKind>,

    /// Do not keep per-sample values (CSV series files stay empty)
    #[arg(long)]
    pub no_series: bool,

    /// Compile the configuration, list the log files and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TELEMETRY_ANALYZER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Analysis configuration file to validate
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Analysis configuration file
    pub config: PathBuf,

    /// Log file or directory whose topics should be listed
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
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
