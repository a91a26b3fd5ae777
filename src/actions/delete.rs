//! File removal for redundant duplicate copies.
//!
//! # Overview
//!
//! - [`DeleteMethod::Permanent`] (default) unlinks the file
//! - [`DeleteMethod::Trash`] moves it to the platform recycle bin
//! - [`delete_batch`] removes a list of paths, recording each failure and
//!   carrying on with the rest
//!
//! # Safety
//!
//! Deletion does not decide *what* to delete; that is the retention
//! planner's job. [`validate_preserves_copy`] is the last guard before a
//! batch is run: it refuses a selection that would leave a group empty.
//!
//! # Example
//!
//! ```no_run
//! use prunedupe::actions::delete::{delete_file, DeleteMethod};
//! use std::path::Path;
//!
//! match delete_file(Path::new("/backup/copy.txt"), DeleteMethod::Permanent) {
//!     Ok(removed) => println!("Removed {} ({} bytes)", removed.path.display(), removed.size),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (already removed or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path exists but is not a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Attempted to delete all copies (at least one must be preserved).
    #[error("cannot delete all copies - at least one file must be preserved")]
    AllCopiesWouldBeDeleted,

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::NotAFile(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::AllCopiesWouldBeDeleted => None,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// How redundant copies are removed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMethod {
    /// Unlink the file. Cannot be undone.
    #[default]
    Permanent,
    /// Move the file to the system trash.
    Trash,
}

impl fmt::Display for DeleteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Trash => write!(f, "trash"),
        }
    }
}

/// A file that was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedFile {
    /// Path that was removed.
    pub path: PathBuf,
    /// Size of the removed file in bytes.
    pub size: u64,
}

/// A path that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFailure {
    /// Path that failed.
    pub path: PathBuf,
    /// Description of the failure.
    pub reason: String,
}

/// Results of a batch deletion operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeleteResult {
    /// Successfully removed files.
    pub successes: Vec<DeletedFile>,
    /// Failed removals with their reasons.
    pub failures: Vec<DeleteFailure>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Total number of attempted deletions.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Paths that could not be removed.
    #[must_use]
    pub fn failed_paths(&self) -> Vec<&Path> {
        self.failures.iter().map(|f| f.path.as_path()).collect()
    }

    /// Fold another batch into this one.
    pub fn merge(&mut self, other: BatchDeleteResult) {
        self.successes.extend(other.successes);
        self.failures.extend(other.failures);
        self.bytes_freed += other.bytes_freed;
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Deleted {} file(s), freed {}",
                self.success_count(),
                ByteSize::b(self.bytes_freed)
            )
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                ByteSize::b(self.bytes_freed)
            )
        }
    }
}

/// Callback trait for deletion progress reporting.
pub trait DeleteProgressCallback: Send + Sync {
    /// Called before each file deletion.
    fn on_before_delete(&self, path: &Path, index: usize, total: usize);

    /// Called after successful deletion.
    fn on_delete_success(&self, path: &Path, size: u64);

    /// Called after failed deletion.
    fn on_delete_failure(&self, path: &Path, error: &str);

    /// Called when batch operation completes.
    fn on_complete(&self, result: &BatchDeleteResult);
}

/// Remove a single file with the given method.
///
/// The size is taken from the file's metadata just before removal. Symbolic
/// links are never followed here: paths handed in are already resolved.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if removal is not allowed
/// - `NotAFile` if the path is a directory or other non-regular entry
/// - `TrashFailed` if the trash operation fails
pub fn delete_file(path: &Path, method: DeleteMethod) -> Result<DeletedFile, DeleteError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    if !metadata.is_file() {
        return Err(DeleteError::NotAFile(path.to_path_buf()));
    }
    let size = metadata.len();

    match method {
        DeleteMethod::Permanent => {
            fs::remove_file(path).map_err(|e| DeleteError::from_io(path, e))?;
            log::info!("Deleted: {} ({} bytes)", path.display(), size);
        }
        DeleteMethod::Trash => {
            trash::delete(path).map_err(|e| DeleteError::TrashFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
        }
    }

    Ok(DeletedFile {
        path: path.to_path_buf(),
        size,
    })
}

/// Remove every path in order.
///
/// A failure is logged with its path, recorded in the result and does not
/// stop the batch.
///
/// ```no_run
/// use prunedupe::actions::delete::{delete_batch, DeleteMethod, NoDeleteProgress};
/// use std::path::PathBuf;
///
/// let paths = vec![PathBuf::from("/dup1.txt"), PathBuf::from("/dup2.txt")];
/// let result = delete_batch::<NoDeleteProgress>(&paths, DeleteMethod::Permanent, None);
/// println!("{}", result.summary());
/// ```
pub fn delete_batch<C: DeleteProgressCallback>(
    paths: &[PathBuf],
    method: DeleteMethod,
    callback: Option<&C>,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();
    let total = paths.len();

    for (index, path) in paths.iter().enumerate() {
        if let Some(cb) = callback {
            cb.on_before_delete(path, index, total);
        }

        match delete_file(path, method) {
            Ok(removed) => {
                result.bytes_freed += removed.size;
                if let Some(cb) = callback {
                    cb.on_delete_success(path, removed.size);
                }
                result.successes.push(removed);
            }
            Err(e) => {
                let reason = e.to_string();
                log::warn!("Failed to delete {}: {}", path.display(), reason);
                if let Some(cb) = callback {
                    cb.on_delete_failure(path, &reason);
                }
                result.failures.push(DeleteFailure {
                    path: path.clone(),
                    reason,
                });
            }
        }
    }

    if let Some(cb) = callback {
        cb.on_complete(&result);
    }
    log::debug!("{}", result.summary());

    result
}

/// Deletion progress sink that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeleteProgress;

impl DeleteProgressCallback for NoDeleteProgress {
    fn on_before_delete(&self, _path: &Path, _index: usize, _total: usize) {}
    fn on_delete_success(&self, _path: &Path, _size: u64) {}
    fn on_delete_failure(&self, _path: &Path, _error: &str) {}
    fn on_complete(&self, _result: &BatchDeleteResult) {}
}

/// Validate that a selection doesn't delete all copies of a group.
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` if no group member is left unselected.
///
/// # Example
///
/// ```
/// use prunedupe::actions::delete::validate_preserves_copy;
/// use std::path::PathBuf;
///
/// let group = vec![PathBuf::from("/original.txt"), PathBuf::from("/copy.txt")];
///
/// assert!(validate_preserves_copy(&[PathBuf::from("/copy.txt")], &group).is_ok());
/// assert!(validate_preserves_copy(&group, &group).is_err());
/// ```
pub fn validate_preserves_copy(
    selected_paths: &[PathBuf],
    group_paths: &[PathBuf],
) -> Result<(), DeleteError> {
    if selected_paths.is_empty() {
        return Ok(());
    }

    let selected: HashSet<&PathBuf> = selected_paths.iter().collect();
    let preserved = group_paths.iter().filter(|p| !selected.contains(p)).count();

    if preserved == 0 {
        log::error!(
            "Refusing to delete all {} copies of a duplicate group",
            group_paths.len()
        );
        Err(DeleteError::AllCopiesWouldBeDeleted)
    } else {
        Ok(())
    }
}
