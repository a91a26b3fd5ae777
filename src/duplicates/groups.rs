//! Duplicate grouping and size-based file organization.
//!
//! # Overview
//!
//! This module provides the bucket types shared by every stage of the
//! pipeline and the size grouping stage itself.
//!
//! ## Size Grouping (Phase 1)
//!
//! Files with different lengths cannot be duplicates, so grouping by exact
//! byte length is a free first filter: it needs metadata only, no reads.
//! Records reached more than once (two links to one file, overlapping roots)
//! are collapsed by resolved path before they are counted.
//!
//! # Example
//!
//! ```
//! use prunedupe::scanner::FileRecord;
//! use prunedupe::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups[&1024].len(), 2);
//! assert_eq!(groups[&2048].len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::scanner::{hash_to_hex, FileRecord, Hash};

/// Files bucketed by byte length.
pub type SizeGroups = HashMap<u64, Vec<FileRecord>>;

/// Bucket key for the prefix and full stages.
///
/// The size is part of the key: two files of different length can share
/// their first 1024 bytes, and must not land in one prefix bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Content digest (prefix or full, depending on the stage)
    pub digest: Hash,
    /// File size in bytes
    pub size: u64,
}

impl GroupKey {
    /// Create a new key.
    #[must_use]
    pub fn new(digest: Hash, size: u64) -> Self {
        Self { digest, size }
    }
}

/// Confirmed group of byte-identical files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Full-content digest and size shared by every member
    pub key: GroupKey,
    /// Members, sorted by path
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group. Members are sorted by path.
    #[must_use]
    pub fn new(key: GroupKey, mut files: Vec<FileRecord>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { key, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Size of each member in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.key.size
    }

    /// Number of redundant copies (total - 1).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes taken by the redundant copies.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.key.size * self.duplicate_count() as u64
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.key.digest)
    }

    /// Member paths.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Statistics from size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Number of distinct files grouped
    pub total_files: usize,
    /// Records dropped because their path was already grouped
    pub repeated_paths: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in buckets of 2+)
    pub potential_duplicates: usize,
    /// Number of files alone in their bucket
    pub eliminated_unique: usize,
    /// Number of size buckets with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size (Phase 1 of duplicate detection).
///
/// Every bucket is returned, singletons included; the prefix stage skips
/// buckets that cannot hold a duplicate. Records are deduplicated by path.
#[must_use]
pub fn group_by_size(files: impl IntoIterator<Item = FileRecord>) -> (SizeGroups, GroupingStats) {
    let mut groups = SizeGroups::new();
    let mut stats = GroupingStats::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for file in files {
        if !seen.insert(file.path.clone()) {
            stats.repeated_paths += 1;
            log::trace!("Skipping repeated path: {}", file.path.display());
            continue;
        }
        stats.total_files += 1;
        stats.total_size += file.size;
        groups.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = groups.len();
    for (size, files) in &groups {
        if files.len() > 1 {
            stats.potential_duplicates += files.len();
            stats.duplicate_groups += 1;
            log::debug!("Size group {} bytes: {} candidates", size, files.len());
        } else {
            stats.eliminated_unique += 1;
        }
    }

    (groups, stats)
}
