//! Command-line interface definitions for prunedupe.
//!
//! Global options (verbosity, color, config file, error format) come before
//! the subcommand.
//!
//! # Example
//!
//! ```bash
//! # List duplicate groups under two trees
//! prunedupe scan ~/photos /mnt/backup/photos
//!
//! # Delete copies in the backup that also exist in the originals
//! prunedupe scan --protected ~/photos --removable /mnt/backup/photos --mode delete
//!
//! # Show what would be deleted, as JSON
//! prunedupe scan --protected ~/photos --removable /mnt/backup --mode delete --dry-run --output json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scanner::HashAlgorithm;

/// Find duplicate files across directory trees and prune redundant copies.
#[derive(Debug, Parser)]
#[command(name = "prunedupe")]
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

    /// Configuration file (TOML). Defaults to the platform config directory.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as a JSON object on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories for duplicate files
    Scan(ScanArgs),
}

/// Arguments for the scan subcommand.
///
/// Options left unset fall back to the configuration file, then the
/// environment, then built-in defaults.
#[derive(Debug, Args, Default)]
pub struct ScanArgs {
    /// Directories to scan (the protected and removable roots are always included)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Files under this directory are never deleted
    #[arg(long, value_name = "DIR")]
    pub protected: Option<PathBuf>,

    /// Files under this directory may be deleted when a copy survives elsewhere
    #[arg(long, value_name = "DIR")]
    pub removable: Option<PathBuf>,

    /// What to do with the duplicates found
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// In delete mode, print the plan without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Content digest algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Number of I/O threads for hashing (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Maximum passes when removing emptied directories (default: 10)
    #[arg(long, value_name = "N")]
    pub reap_passes: Option<usize>,

    /// Move deleted files to the system trash instead of unlinking them
    #[arg(long)]
    pub trash: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,
}

/// What the scan does with confirmed duplicates.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Print each duplicate group
    #[default]
    Report,
    /// Delete redundant copies under the removable root, then remove empty
    /// directories left there (outside the protected root)
    Delete,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Report => write!(f, "report"),
            Mode::Delete => write!(f, "delete"),
        }
    }
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use prunedupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1.5MB").unwrap(), 1_500_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num_str, suffix) = (&s[..split], s[split..].trim().to_uppercase());

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1 << 10,
        "MB" | "M" => 1_000_000,
        "MIB" => 1 << 20,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1 << 30,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
