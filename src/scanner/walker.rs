//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one scan root
//! and the [`MultiWalker`] for several roots at once. Both yield
//! [`FileRecord`]s for regular files only. Every entry is resolved to its
//! real target path first, so a symbolic link and the file it points at are
//! the same record, and each resolved path is reported once.
//!
//! # Features
//!
//! - Parallel directory reading via jwalk, sorted for deterministic output
//! - Symlinks resolved to their targets (symlinked directories are not entered)
//! - Size and hidden-file filtering
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use prunedupe::scanner::{MultiWalker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = MultiWalker::new(
//!     vec![PathBuf::from("/backup/master"), PathBuf::from("/backup/old")],
//!     WalkerConfig::default(),
//! );
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{FileRecord, ScanError, WalkerConfig};

/// Directory walker for a single root.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> {
        dedupe_by_path(walk_root(
            self.root.clone(),
            self.config.clone(),
            self.shutdown_flag.clone(),
        ))
    }
}

/// Walker over several roots that reports each resolved file once.
///
/// Roots are canonicalized, duplicates are dropped, and a root that lies
/// inside another supplied root is not walked separately.
#[derive(Debug)]
pub struct MultiWalker {
    roots: Vec<PathBuf>,
    config: WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl MultiWalker {
    /// Create a walker for the given roots.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self {
            roots: normalize_roots(paths),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The roots that will actually be walked, in order.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walk every root in order, yielding each resolved file once.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let walks = self.roots.iter().flat_map(|root| {
            walk_root(
                root.clone(),
                self.config.clone(),
                self.shutdown_flag.clone(),
            )
        });
        dedupe_by_path(walks)
    }
}

/// Canonicalize, dedupe and drop nested roots.
fn normalize_roots(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut canonical: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        let resolved = match fs::canonicalize(&path) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Cannot resolve scan root {}: {}", path.display(), e);
                continue;
            }
        };
        if !canonical.contains(&resolved) {
            canonical.push(resolved);
        }
    }

    let all = canonical.clone();
    canonical.retain(|root| {
        let nested = all.iter().any(|other| other != root && root.starts_with(other));
        if nested {
            log::debug!("Scan root {} is inside another root", root.display());
        }
        !nested
    });
    canonical
}

fn dedupe_by_path(
    records: impl Iterator<Item = Result<FileRecord, ScanError>>,
) -> impl Iterator<Item = Result<FileRecord, ScanError>> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    records.filter(move |result| match result {
        Ok(record) => {
            if seen.insert(record.path.clone()) {
                true
            } else {
                log::trace!("Already indexed: {}", record.path.display());
                false
            }
        }
        Err(_) => true,
    })
}

fn walk_root(
    root: PathBuf,
    config: WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
) -> impl Iterator<Item = Result<FileRecord, ScanError>> {
    let walk_dir = WalkDir::new(&root)
        .follow_links(false)
        .skip_hidden(config.skip_hidden)
        .sort(true);

    walk_dir
        .into_iter()
        .take_while(move |_| {
            let stop = shutdown_flag
                .as_ref()
                .is_some_and(|f| f.load(Ordering::SeqCst));
            if stop {
                log::debug!("Walker: Shutdown requested, stopping iteration");
            }
            !stop
        })
        .filter_map(move |entry_result| match entry_result {
            Ok(entry) => {
                let path = entry.path();
                if path == root || entry.file_type().is_dir() {
                    return None;
                }
                inspect_entry(&path, entry.file_type().is_symlink(), &config)
            }
            Err(e) => {
                let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
                log::warn!("Walker error for {}: {}", path.display(), e);
                Some(Err(ScanError::Io {
                    path,
                    message: e.to_string(),
                }))
            }
        })
}

/// Resolve an entry to its target and build a record for regular files.
fn inspect_entry(
    path: &Path,
    is_symlink: bool,
    config: &WalkerConfig,
) -> Option<Result<FileRecord, ScanError>> {
    let resolved = match fs::canonicalize(path) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("Cannot resolve {}: {}", path.display(), e);
            return Some(Err(if is_symlink {
                ScanError::Unresolvable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            } else {
                ScanError::from_io(path, &e)
            }));
        }
    };

    let metadata = match fs::metadata(&resolved) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("Cannot stat {}: {}", resolved.display(), e);
            return Some(Err(ScanError::from_io(&resolved, &e)));
        }
    };

    if !metadata.is_file() {
        log::trace!("Skipping non-regular entry: {}", path.display());
        return None;
    }

    let size = metadata.len();
    if !config.accepts_size(size) {
        log::trace!("Skipping file due to size filter ({}): {}", size, path.display());
        return None;
    }

    if is_symlink {
        log::trace!("Resolved link {} -> {}", path.display(), resolved.display());
    }
    Some(Ok(FileRecord::new(resolved, size)))
}
