//! Retention planning for duplicate groups.
//!
//! # Overview
//!
//! Given the members of one duplicate group and the protected/removable
//! roots, [`plan_retention`] decides which copies are kept and which may be
//! deleted. It performs no I/O, so the same group always produces the same
//! decision.
//!
//! # Rules
//!
//! - A member is deletable only if it lies under the removable root and
//!   **not** under the protected root.
//! - Everything else (protected, under neither root, under both) is kept.
//! - If no member lies under the protected root, the first deletable member
//!   is kept as well, so every group keeps a copy under the removable root
//!   or the protected root.
//!
//! "Under" is component-wise containment: `/data/src2` is not under
//! `/data/src`.
//!
//! # Example
//!
//! ```
//! use prunedupe::actions::retention::{plan_retention, RootDesignation};
//! use std::path::PathBuf;
//!
//! let roots = RootDesignation::new(Some(PathBuf::from("/src")), PathBuf::from("/dst"));
//! let members = vec![PathBuf::from("/src/a.txt"), PathBuf::from("/dst/a.txt")];
//!
//! let decision = plan_retention(&members, &roots);
//! assert_eq!(decision.keep, vec![PathBuf::from("/src/a.txt")]);
//! assert_eq!(decision.delete, vec![PathBuf::from("/dst/a.txt")]);
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The asymmetric retention roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootDesignation {
    /// Files under this root are never deleted.
    pub protected: Option<PathBuf>,
    /// Files under this root (and not protected) may be deleted.
    pub removable: PathBuf,
}

impl RootDesignation {
    /// Create a new root designation.
    #[must_use]
    pub fn new(protected: Option<PathBuf>, removable: PathBuf) -> Self {
        Self {
            protected,
            removable,
        }
    }

    /// Check whether a path lies under the protected root.
    #[must_use]
    pub fn is_protected(&self, path: &Path) -> bool {
        self.protected
            .as_deref()
            .is_some_and(|root| path.starts_with(root))
    }

    /// Check whether a path lies under the removable root.
    #[must_use]
    pub fn is_removable(&self, path: &Path) -> bool {
        path.starts_with(&self.removable)
    }

    /// Check whether a path may be deleted.
    #[must_use]
    pub fn is_deletable(&self, path: &Path) -> bool {
        self.is_removable(path) && !self.is_protected(path)
    }
}

/// Violation found by [`RetentionDecision::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetentionError {
    /// Every copy of a non-empty group was scheduled for deletion.
    #[error("no surviving copy in a group of {0} file(s)")]
    NoSurvivor(usize),

    /// A path appears in both the keep and delete lists.
    #[error("path is both kept and deleted: {0}")]
    Overlap(PathBuf),

    /// A group member was neither kept nor deleted.
    #[error("group member missing from plan: {0}")]
    Uncovered(PathBuf),

    /// The plan contains a path that is not a group member.
    #[error("path is not a group member: {0}")]
    Foreign(PathBuf),
}

/// Outcome of retention planning for one duplicate group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionDecision {
    /// Paths to keep, in member order.
    pub keep: Vec<PathBuf>,
    /// Paths to delete, in member order.
    pub delete: Vec<PathBuf>,
}

impl RetentionDecision {
    /// Number of distinct copies in the group.
    #[must_use]
    pub fn duplicates(&self) -> usize {
        self.keep.len() + self.delete.len()
    }

    /// Number of copies kept.
    #[must_use]
    pub fn kept(&self) -> usize {
        self.keep.len()
    }

    /// Number of copies scheduled for deletion.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.delete.len()
    }

    /// Re-check the plan against the members it was built from.
    ///
    /// # Errors
    ///
    /// Returns the first [`RetentionError`] found.
    pub fn validate(&self, members: &[PathBuf]) -> Result<(), RetentionError> {
        let distinct: HashSet<&Path> = members.iter().map(PathBuf::as_path).collect();
        if !distinct.is_empty() && self.keep.is_empty() {
            return Err(RetentionError::NoSurvivor(distinct.len()));
        }

        let kept: HashSet<&Path> = self.keep.iter().map(PathBuf::as_path).collect();
        if let Some(path) = self.delete.iter().find(|p| kept.contains(p.as_path())) {
            return Err(RetentionError::Overlap(path.clone()));
        }

        if let Some(path) = self
            .keep
            .iter()
            .chain(&self.delete)
            .find(|p| !distinct.contains(p.as_path()))
        {
            return Err(RetentionError::Foreign(path.clone()));
        }

        let planned: HashSet<&Path> = self
            .keep
            .iter()
            .chain(&self.delete)
            .map(PathBuf::as_path)
            .collect();
        if let Some(path) = members.iter().find(|p| !planned.contains(p.as_path())) {
            return Err(RetentionError::Uncovered(path.clone()));
        }

        Ok(())
    }
}

/// Decide which members of one duplicate group to keep and delete.
///
/// Members are deduplicated first (first occurrence wins). A group with
/// fewer than two distinct members is kept whole.
#[must_use]
pub fn plan_retention(members: &[PathBuf], roots: &RootDesignation) -> RetentionDecision {
    let mut seen: HashSet<&Path> = HashSet::with_capacity(members.len());
    let distinct: Vec<&PathBuf> = members
        .iter()
        .filter(|p| seen.insert(p.as_path()))
        .collect();

    if distinct.len() < 2 {
        return RetentionDecision {
            keep: distinct.into_iter().cloned().collect(),
            delete: Vec::new(),
        };
    }

    // Copies outside both roots do not count as survivors.
    let survivor = if distinct.iter().any(|p| roots.is_protected(p)) {
        None
    } else {
        distinct.iter().copied().find(|p| roots.is_deletable(p))
    };
    if let Some(path) = survivor {
        log::debug!(
            "Group has no member under the protected root, keeping {}",
            path.display()
        );
    }

    let (delete, keep): (Vec<&PathBuf>, Vec<&PathBuf>) = distinct
        .into_iter()
        .partition(|p| roots.is_deletable(p) && Some(*p) != survivor);

    RetentionDecision {
        keep: keep.into_iter().cloned().collect(),
        delete: delete.into_iter().cloned().collect(),
    }
}
