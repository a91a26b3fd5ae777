//! Scanner module for directory traversal and content fingerprinting.
//!
//! This module provides functionality for:
//! - Walking scan roots and resolving symbolic links to their targets
//! - Fingerprinting file contents (prefix or full) with a pluggable digest
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Streaming content fingerprints (BLAKE3 or SHA-256)
//!
//! # Example
//!
//! ```no_run
//! use prunedupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// Re-export main types
pub use hasher::{hash_to_hex, ChunkReader, DigestMode, Hash, HashAlgorithm, Hasher, PREFIX_SIZE};
pub use walker::{MultiWalker, Walker};

/// A regular file discovered during the walk.
///
/// `path` is absolute and symlink-resolved; it is the identity of the record.
/// `size` is the byte length observed at discovery time and may go stale if
/// the file changes while the run is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute, canonical path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }

    /// Borrow the record's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Skip zero-length files.
    ///
    /// Off by default: every empty file is a duplicate of every other one.
    pub skip_empty: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,
}

impl WalkerConfig {
    /// Check if a file size passes the configured filters.
    #[must_use]
    pub fn accepts_size(&self, size: u64) -> bool {
        if size == 0 && self.skip_empty {
            return false;
        }
        if self.min_size.is_some_and(|min| size < min) {
            return false;
        }
        if self.max_size.is_some_and(|max| size > max) {
            return false;
        }
        true
    }
}

/// Errors that can occur while discovering a single entry.
///
/// These are never fatal: the entry is logged and left out of the index.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry disappeared between listing and inspection.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A symbolic link could not be resolved to its target.
    #[error("Cannot resolve link {path}: {message}")]
    Unresolvable {
        /// Path of the link
        path: PathBuf,
        /// Description of the failure
        message: String,
    },

    /// An I/O error occurred while accessing an entry.
    #[error("I/O error for {path}: {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Description of the underlying I/O error
        message: String,
    },

    /// A file could not be fingerprinted.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                message: error.to_string(),
            },
        }
    }
}

/// Errors that can occur while fingerprinting a file.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The file was not found (possibly removed mid-run).
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Description of the underlying I/O error
        message: String,
    },

    /// Hashing was abandoned because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),
}

impl HashError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                message: error.to_string(),
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
