//! File actions module.
//!
//! This module provides functionality for:
//! - Deciding which copies of a duplicate group survive ([`retention`])
//! - Removing the redundant copies ([`delete`])
//! - Cleaning up directories left empty ([`reaper`])
//! - Running all of the above over a scan result ([`prune`])
//!
//! ```no_run
//! use prunedupe::actions::retention::{plan_retention, RootDesignation};
//! use std::path::PathBuf;
//!
//! let roots = RootDesignation::new(Some(PathBuf::from("/photos")), PathBuf::from("/backup"));
//! let decision = plan_retention(
//!     &[PathBuf::from("/photos/a.jpg"), PathBuf::from("/backup/a.jpg")],
//!     &roots,
//! );
//! assert_eq!(decision.deleted(), 1);
//! ```

pub mod delete;
pub mod prune;
pub mod reaper;
pub mod retention;

// Re-export commonly used types
pub use delete::{
    delete_batch, delete_file, validate_preserves_copy, BatchDeleteResult, DeleteError,
    DeleteMethod, DeleteProgressCallback, NoDeleteProgress,
};
pub use prune::{prune_duplicates, GroupOutcome, PruneError, PruneOptions, PruneReport};
pub use reaper::{reap_empty_dirs, reap_until_stable, ReapError, ReapResult, DEFAULT_REAP_PASSES};
pub use retention::{plan_retention, RetentionDecision, RetentionError, RootDesignation};
