//! Removal of directories left empty after pruning.
//!
//! [`reap_empty_dirs`] makes one bottom-up pass over a tree: children are
//! visited before their parent, so a chain of directories that only held
//! each other collapses in a single pass. The root itself is never removed
//! and symbolic links to directories are not followed. Directories under an
//! excluded (protected) root are never removed; a root that itself lies
//! under the excluded root is not reaped at all.
//!
//! [`reap_until_stable`] repeats the pass until nothing more is removed or
//! the pass limit is reached.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

/// Default maximum number of reaping passes.
pub const DEFAULT_REAP_PASSES: usize = 10;

/// A directory that could not be inspected or removed.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReapError {
    /// The directory gained an entry between inspection and removal.
    #[error("directory not empty: {0}")]
    NotEmpty(PathBuf),

    /// Permission denied when listing or removing.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Any other I/O failure.
    #[error("I/O error for {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl ReapError {
    fn from_io(path: &Path, error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::DirectoryNotEmpty => Self::NotEmpty(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                message: error.to_string(),
            },
        }
    }

    /// Path of the directory that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotEmpty(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}

/// Outcome of one or more reaping passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReapResult {
    /// Directories removed, in removal order.
    pub removed: Vec<PathBuf>,
    /// Directories that could not be handled.
    pub failures: Vec<ReapError>,
    /// Number of passes run.
    pub passes: usize,
}

impl ReapResult {
    /// Number of directories removed.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

fn is_excluded(path: &Path, exclude: Option<&Path>) -> bool {
    exclude.is_some_and(|root| path.starts_with(root))
}

/// Remove empty directories below `root` in one bottom-up pass.
///
/// A directory is removed only if it has no entries when it is evaluated
/// and does not lie under `exclude`. Failures are logged and recorded; they
/// never abort the pass.
#[must_use]
pub fn reap_empty_dirs(root: &Path, exclude: Option<&Path>) -> ReapResult {
    let mut result = ReapResult {
        passes: 1,
        ..ReapResult::default()
    };

    if is_excluded(root, exclude) {
        log::debug!("Not reaping {}: inside the protected root", root.display());
        return result;
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .contents_first(true)
        .min_depth(1);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                if is_excluded(&path, exclude) {
                    continue;
                }
                let error = match e.io_error() {
                    Some(io_err) => ReapError::from_io(&path, io_err),
                    None => ReapError::Io {
                        path: path.clone(),
                        message: e.to_string(),
                    },
                };
                log::warn!("Cannot inspect {}: {}", path.display(), error);
                result.failures.push(error);
                continue;
            }
        };

        // Not `filter_entry`: under `contents_first` it skips the parent's
        // remaining entries.
        if !entry.file_type().is_dir() || is_excluded(entry.path(), exclude) {
            continue;
        }
        let path = entry.path();

        match is_empty_dir(path) {
            Ok(true) => match fs::remove_dir(path) {
                Ok(()) => {
                    log::debug!("Removed empty directory: {}", path.display());
                    result.removed.push(path.to_path_buf());
                }
                Err(e) => {
                    let error = ReapError::from_io(path, &e);
                    log::warn!("Failed to remove directory {}: {}", path.display(), error);
                    result.failures.push(error);
                }
            },
            Ok(false) => {}
            Err(e) => {
                let error = ReapError::from_io(path, &e);
                log::warn!("Cannot list directory {}: {}", path.display(), error);
                result.failures.push(error);
            }
        }
    }

    result
}

/// Run [`reap_empty_dirs`] until a pass removes nothing.
///
/// At most `max_passes` passes are run (at least one). Failures from every
/// pass are kept.
#[must_use]
pub fn reap_until_stable(root: &Path, exclude: Option<&Path>, max_passes: usize) -> ReapResult {
    let mut total = ReapResult::default();

    for pass in 1..=max_passes.max(1) {
        let result = reap_empty_dirs(root, exclude);
        total.passes = pass;
        let removed = result.removed_count();
        total.removed.extend(result.removed);
        total.failures.extend(result.failures);

        log::trace!("Reap pass {}: removed {} directories", pass, removed);
        if removed == 0 {
            break;
        }
    }

    if total.removed_count() > 0 {
        log::info!(
            "Removed {} empty directories under {} in {} pass(es)",
            total.removed_count(),
            root.display(),
            total.passes
        );
    }
    total
}
