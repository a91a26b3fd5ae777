//! JSON output formatter for scan and prune results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     { "hash": "abc123...", "size": 1024, "files": ["/a/x.txt", "/b/x.txt"] }
//!   ],
//!   "summary": {
//!     "roots": ["/a", "/b"],
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "failed_files": 0,
//!     "scan_duration_ms": 1234,
//!     "exit_code": 0,
//!     "exit_code_name": "PD000"
//!   },
//!   "prune": {
//!     "dry_run": false,
//!     "groups": [
//!       { "hash": "abc123...", "size": 1024, "duplicates": 2, "deleted": 1, "kept": 1,
//!         "keep": ["/a/x.txt"], "delete": ["/b/x.txt"], "failures": [] }
//!     ],
//!     "totals": { "duplicates": 2, "deleted": 1, "kept": 1, "failed": 0,
//!                 "bytes_freed": 1024, "directories_removed": 0 }
//!   }
//! }
//! ```
//!
//! `prune` is only present in delete mode.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::actions::delete::DeleteFailure;
use crate::actions::prune::{GroupOutcome, PruneReport};
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Content digest as hexadecimal string (64 characters)
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Member paths, sorted
    pub files: Vec<PathBuf>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size(),
            files: group.paths(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Roots that were walked
    pub roots: Vec<PathBuf>,
    /// Total number of files indexed
    pub total_files: usize,
    /// Total size of all indexed files in bytes
    pub total_size: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies (excluding one per group)
    pub duplicate_files: usize,
    /// Bytes that removing every redundant copy would free
    pub reclaimable_space: u64,
    /// Files that could not be read
    pub failed_files: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "PD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            roots: summary.roots.clone(),
            total_files: summary.total_files,
            total_size: summary.total_size,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            failed_files: summary.failed_files,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Retention outcome of one group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroupOutcome {
    pub hash: String,
    pub size: u64,
    pub duplicates: usize,
    pub deleted: usize,
    pub kept: usize,
    pub keep: Vec<PathBuf>,
    pub delete: Vec<PathBuf>,
    pub failures: Vec<DeleteFailure>,
}

impl JsonGroupOutcome {
    fn new(group: &GroupOutcome, dry_run: bool) -> Self {
        Self {
            hash: group.hash.clone(),
            size: group.size,
            duplicates: group.duplicates(),
            deleted: group.deleted(dry_run),
            kept: group.kept(),
            keep: group.decision.keep.clone(),
            delete: group.decision.delete.clone(),
            failures: group.result.failures.clone(),
        }
    }
}

/// Run totals for delete mode.
#[derive(Debug, Clone, Serialize)]
pub struct JsonPruneTotals {
    pub duplicates: usize,
    pub deleted: usize,
    pub kept: usize,
    pub failed: usize,
    pub bytes_freed: u64,
    pub directories_removed: usize,
}

/// Delete-mode section.
#[derive(Debug, Clone, Serialize)]
pub struct JsonPrune {
    pub dry_run: bool,
    pub groups: Vec<JsonGroupOutcome>,
    pub totals: JsonPruneTotals,
}

impl From<&PruneReport> for JsonPrune {
    fn from(report: &PruneReport) -> Self {
        Self {
            dry_run: report.dry_run,
            groups: report
                .groups
                .iter()
                .map(|g| JsonGroupOutcome::new(g, report.dry_run))
                .collect(),
            totals: JsonPruneTotals {
                duplicates: report.total_duplicates(),
                deleted: report.total_deleted(),
                kept: report.total_kept(),
                failed: report.total_failed(),
                bytes_freed: report.bytes_freed(),
                directories_removed: report.reap.removed_count(),
            },
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Confirmed duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
    /// Retention outcomes, in delete mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prune: Option<JsonPrune>,
}

impl JsonOutput {
    /// Build the output for a report-mode run.
    ///
    /// ```
    /// use prunedupe::duplicates::ScanSummary;
    /// use prunedupe::output::json::JsonOutput;
    /// use prunedupe::error::ExitCode;
    ///
    /// let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::Success);
    /// assert!(output.to_json().unwrap().starts_with('{'));
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
            prune: None,
        }
    }

    /// Attach delete-mode outcomes.
    #[must_use]
    pub fn with_prune(mut self, report: &PruneReport) -> Self {
        self.prune = Some(JsonPrune::from(report));
        self
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        if pretty {
            serde_json::to_writer_pretty(&mut *writer, self)?;
        } else {
            serde_json::to_writer(&mut *writer, self)?;
        }
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
