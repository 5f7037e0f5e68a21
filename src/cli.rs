//! Command-line interface definitions for recdupe.
//!
//! All CLI arguments, subcommands, and options using the clap derive API,
//! with global options (verbosity, color, error format) and one subcommand
//! per mode of operation.
//!
//! # Example
//!
//! ```bash
//! # Detect duplicates in a CSV file, human-readable output
//! recdupe detect accounts.csv --match-fields email --master-field score
//!
//! # Match on several fields, JSON output for scripting
//! recdupe detect accounts.json --match-fields email,zip --master-field updated_at --output json
//!
//! # Run every job from a config file
//! recdupe run --config jobs.toml
//!
//! # Start the upload web UI
//! recdupe serve --bind 127.0.0.1:8080
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::detect::Strategy;

/// Duplicate record detection with master selection.
///
/// recdupe groups flat key-value records (CSV or JSON) by an exact-match
/// key, selects a master per duplicate group, and reports the groups as
/// text, JSON, or CSV.
#[derive(Debug, Parser)]
#[command(name = "recdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for recdupe.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect duplicates in a single input file
    Detect(DetectArgs),
    /// Run every detection job from a config file
    Run(RunArgs),
    /// Serve the HTTP upload interface
    Serve(ServeArgs),
}

/// Arguments for the detect subcommand.
#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Path to the input CSV or JSON file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Fields used to detect duplicates (comma-separated, order matters)
    #[arg(
        long,
        value_name = "FIELDS",
        value_delimiter = ',',
        required = true
    )]
    pub match_fields: Vec<String>,

    /// Field used to select the master record
    #[arg(long, value_name = "FIELD")]
    pub master_field: String,

    /// Strategy for choosing the master record
    #[arg(short, long, value_enum, default_value_t = Strategy::Highest)]
    pub strategy: Strategy,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the run subcommand.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the jobs configuration file (TOML)
    #[arg(short, long, value_name = "FILE", default_value = "recdupe.toml")]
    pub config: PathBuf,
}

/// Arguments for the serve subcommand.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to
    #[arg(short, long, value_name = "ADDR", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,
}

/// Output format for detection results.
///
/// Also appears in job files, so it round-trips through serde using the
/// same lowercase tokens clap accepts on the command line.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output for scripting
    Json,
    /// CSV output for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
