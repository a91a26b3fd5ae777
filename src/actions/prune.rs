//! Applying retention decisions to confirmed duplicate groups.
//!
//! [`prune_duplicates`] plans every group first, checks every plan, and only
//! then removes files. If any file was removed, empty directories under the
//! removable root are then reaped; nothing under the protected root is
//! reaped.
//!
//! ```no_run
//! use prunedupe::actions::prune::{prune_duplicates, PruneOptions};
//! use prunedupe::actions::retention::RootDesignation;
//! use prunedupe::actions::delete::NoDeleteProgress;
//! use prunedupe::duplicates::DuplicateFinder;
//! use std::path::PathBuf;
//!
//! let roots = RootDesignation::new(Some(PathBuf::from("/src")), PathBuf::from("/backup"));
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _) = finder
//!     .find_duplicates_in_paths(&[PathBuf::from("/src"), PathBuf::from("/backup")])
//!     .unwrap();
//!
//! let report = prune_duplicates::<NoDeleteProgress>(&groups, &roots, &PruneOptions::default(), None)
//!     .unwrap();
//! println!("{} deleted, {} kept", report.total_deleted(), report.total_kept());
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::delete::{
    delete_batch, validate_preserves_copy, BatchDeleteResult, DeleteError, DeleteMethod,
    DeleteProgressCallback,
};
use super::reaper::{reap_until_stable, ReapResult, DEFAULT_REAP_PASSES};
use super::retention::{plan_retention, RetentionDecision, RetentionError, RootDesignation};
use crate::duplicates::DuplicateGroup;

/// Options controlling how decisions are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOptions {
    /// How files are removed.
    pub method: DeleteMethod,
    /// Plan only; touch nothing on disk.
    pub dry_run: bool,
    /// Maximum empty-directory reaping passes.
    pub reap_passes: usize,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            method: DeleteMethod::default(),
            dry_run: false,
            reap_passes: DEFAULT_REAP_PASSES,
        }
    }
}

impl PruneOptions {
    /// Set the removal method.
    #[must_use]
    pub fn with_method(mut self, method: DeleteMethod) -> Self {
        self.method = method;
        self
    }

    /// Enable or disable dry-run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the reaping pass limit.
    #[must_use]
    pub fn with_reap_passes(mut self, passes: usize) -> Self {
        self.reap_passes = passes;
        self
    }
}

/// A plan failed its checks; nothing was deleted.
#[derive(Debug, Error)]
pub enum PruneError {
    /// A retention decision broke its invariants.
    #[error("invalid retention plan for group {hash}: {source}")]
    InvalidPlan {
        hash: String,
        #[source]
        source: RetentionError,
    },

    /// A deletion selection would remove every copy.
    #[error("unsafe deletion for group {hash}: {source}")]
    UnsafeSelection {
        hash: String,
        #[source]
        source: DeleteError,
    },
}

/// What happened to one duplicate group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutcome {
    /// Full-content digest (hex).
    pub hash: String,
    /// Size of each copy in bytes.
    pub size: u64,
    /// The retention decision.
    pub decision: RetentionDecision,
    /// Removal results (empty in dry-run).
    pub result: BatchDeleteResult,
}

impl GroupOutcome {
    /// Number of distinct copies found.
    #[must_use]
    pub fn duplicates(&self) -> usize {
        self.decision.duplicates()
    }

    /// Number of copies kept.
    #[must_use]
    pub fn kept(&self) -> usize {
        self.decision.kept()
    }

    /// Number of copies removed, or planned for removal in dry-run.
    #[must_use]
    pub fn deleted(&self, dry_run: bool) -> usize {
        if dry_run {
            self.decision.deleted()
        } else {
            self.result.success_count()
        }
    }
}

/// Outcome of a prune run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PruneReport {
    /// Whether this was a dry-run.
    pub dry_run: bool,
    /// Per-group outcomes, in group order.
    pub groups: Vec<GroupOutcome>,
    /// Empty-directory reaping results.
    pub reap: ReapResult,
}

impl PruneReport {
    /// Copies found across all groups.
    #[must_use]
    pub fn total_duplicates(&self) -> usize {
        self.groups.iter().map(GroupOutcome::duplicates).sum()
    }

    /// Copies removed (or planned for removal in dry-run).
    #[must_use]
    pub fn total_deleted(&self) -> usize {
        self.groups.iter().map(|g| g.deleted(self.dry_run)).sum()
    }

    /// Copies kept.
    #[must_use]
    pub fn total_kept(&self) -> usize {
        self.groups.iter().map(GroupOutcome::kept).sum()
    }

    /// Removals that failed.
    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.groups.iter().map(|g| g.result.failure_count()).sum()
    }

    /// Bytes freed (or that would be freed in dry-run).
    #[must_use]
    pub fn bytes_freed(&self) -> u64 {
        if self.dry_run {
            self.groups
                .iter()
                .map(|g| g.size * g.decision.deleted() as u64)
                .sum()
        } else {
            self.groups.iter().map(|g| g.result.bytes_freed).sum()
        }
    }

    /// Paths that could not be removed.
    #[must_use]
    pub fn failed_paths(&self) -> Vec<PathBuf> {
        self.groups
            .iter()
            .flat_map(|g| g.result.failures.iter().map(|f| f.path.clone()))
            .collect()
    }
}

/// Plan, check and apply retention for every group.
///
/// All plans are checked before the first file is touched. Individual
/// removal failures are recorded in the report and do not stop the run.
///
/// # Errors
///
/// Returns [`PruneError`] if any plan fails its checks; in that case no
/// file has been removed.
pub fn prune_duplicates<C: DeleteProgressCallback>(
    groups: &[DuplicateGroup],
    roots: &RootDesignation,
    options: &PruneOptions,
    callback: Option<&C>,
) -> Result<PruneReport, PruneError> {
    let mut planned = Vec::with_capacity(groups.len());
    for group in groups {
        let members = group.paths();
        let decision = plan_retention(&members, roots);

        decision
            .validate(&members)
            .map_err(|source| PruneError::InvalidPlan {
                hash: group.hash_hex(),
                source,
            })?;
        validate_preserves_copy(&decision.delete, &members).map_err(|source| {
            PruneError::UnsafeSelection {
                hash: group.hash_hex(),
                source,
            }
        })?;

        log::debug!(
            "Group {}: {} found, {} to delete, {} to keep",
            group.hash_hex(),
            decision.duplicates(),
            decision.deleted(),
            decision.kept()
        );
        planned.push((group, decision));
    }

    let mut report = PruneReport {
        dry_run: options.dry_run,
        ..PruneReport::default()
    };

    for (group, decision) in planned {
        let result = if options.dry_run || decision.delete.is_empty() {
            BatchDeleteResult::default()
        } else {
            delete_batch(&decision.delete, options.method, callback)
        };
        report.groups.push(GroupOutcome {
            hash: group.hash_hex(),
            size: group.size(),
            decision,
            result,
        });
    }

    if options.dry_run {
        log::info!(
            "Dry run: {} of {} copies would be deleted",
            report.total_deleted(),
            report.total_duplicates()
        );
    } else {
        if report.total_deleted() > 0 {
            report.reap = reap_until_stable(
                &roots.removable,
                roots.protected.as_deref(),
                options.reap_passes,
            );
        } else {
            log::debug!("Nothing removed, skipping empty-directory reaping");
        }
        log::info!(
            "{} duplicates found, {} deleted, {} kept, {} failed",
            report.total_duplicates(),
            report.total_deleted(),
            report.total_kept(),
            report.total_failed()
        );
    }

    Ok(report)
}
