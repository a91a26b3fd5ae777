//! Duplicate finder implementation with multi-phase detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Phase 1 - Size grouping**: Group files by size (see [`crate::duplicates::groups`])
//! 2. **Phase 2 - Prefix**: Digest the first 1024 bytes of same-size files
//! 3. **Phase 3 - Full hash**: Digest the entire content of prefix matches
//!
//! Each phase consumes the complete output of the previous one. Within the
//! prefix and full phases the per-file hashing runs on a bounded rayon pool;
//! the workers only return `(record, result)` pairs and the calling thread
//! folds them into the bucket map, so membership never depends on the order
//! in which workers finish.
//!
//! # Example
//!
//! ```no_run
//! use prunedupe::scanner::{Hasher, MultiWalker, WalkerConfig};
//! use prunedupe::duplicates::{group_by_size, phase2_prefix, phase3_full, HashPhaseConfig};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let walker = MultiWalker::new(vec![PathBuf::from(".")], WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! let (size_groups, _) = group_by_size(files);
//!
//! let hasher = Arc::new(Hasher::new());
//! let (prefix_groups, _) = phase2_prefix(size_groups, hasher.clone(), HashPhaseConfig::default());
//! let (groups, stats) = phase3_full(prefix_groups, hasher, HashPhaseConfig::default());
//!
//! println!("{} duplicate groups", stats.duplicate_groups);
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::groups::{group_by_size, DuplicateGroup, GroupKey, SizeGroups};
use crate::progress::ProgressCallback;
use crate::scanner::{
    hash_to_hex, DigestMode, FileRecord, Hash, HashAlgorithm, HashError, Hasher, MultiWalker,
    ScanError, WalkerConfig,
};

/// Files bucketed by prefix digest and size.
pub type PrefixGroups = HashMap<GroupKey, Vec<FileRecord>>;

/// Configuration shared by the prefix and full hashing phases.
#[derive(Clone)]
pub struct HashPhaseConfig {
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for HashPhaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashPhaseConfig")
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for HashPhaseConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl HashPhaseConfig {
    /// Set the I/O thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from one hashing phase.
#[derive(Debug, Clone, Default)]
pub struct PhaseStats {
    /// Files in the buckets handed to this phase
    pub input_files: usize,
    /// Files skipped because their bucket had fewer than 2 members
    pub skipped_singletons: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Number of files that failed to hash (excluded from comparison)
    pub failed_files: usize,
    /// Errors encountered, one per failed file
    pub errors: Vec<HashError>,
    /// Bytes covered by successful digests
    pub bytes_hashed: u64,
    /// Buckets with 2+ members after this phase
    pub duplicate_groups: usize,
    /// Files in buckets with 2+ members after this phase
    pub potential_duplicates: usize,
    /// Whether the phase was interrupted by shutdown
    pub interrupted: bool,
}

impl PhaseStats {
    /// Number of copies beyond the first in each surviving bucket.
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.potential_duplicates - self.duplicate_groups
    }
}

/// Build a bounded pool, falling back to the global pool.
fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!(
                "Failed to create I/O thread pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            None
        }
    }
}

/// Digest every file of every multi-member bucket.
///
/// Returns the results in input order alongside the singleton count.
fn hash_candidates(
    buckets: Vec<Vec<FileRecord>>,
    hasher: &Hasher,
    mode: DigestMode,
    phase: &str,
    config: &HashPhaseConfig,
    stats: &mut PhaseStats,
) -> Vec<(FileRecord, Result<Hash, HashError>)> {
    let mut candidates = Vec::new();
    for bucket in buckets {
        stats.input_files += bucket.len();
        if bucket.len() < 2 {
            stats.skipped_singletons += bucket.len();
            continue;
        }
        candidates.extend(bucket);
    }

    if candidates.is_empty() {
        return Vec::new();
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(phase, candidates.len());
    }

    let work = || {
        candidates
            .into_par_iter()
            .enumerate()
            .map(|(idx, file)| {
                if config.is_shutdown_requested() {
                    let err = HashError::Interrupted(file.path.clone());
                    return (file, Err(err));
                }
                if let Some(ref callback) = config.progress_callback {
                    callback.on_progress(idx + 1, file.path.to_string_lossy().as_ref());
                }
                let result = hasher.digest(&file.path, mode);
                match &result {
                    Ok(_) => log::trace!("{} digest computed: {}", phase, file.path.display()),
                    Err(HashError::Interrupted(_)) => {}
                    Err(e) => log::warn!("Failed to {} hash {}: {}", phase, file.path.display(), e),
                }
                (file, result)
            })
            .collect::<Vec<_>>()
    };

    let results = match build_pool(config.io_threads) {
        Some(pool) => pool.install(work),
        None => work(),
    };

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(phase);
    }

    results
}

/// Fold hashing results into buckets keyed by (digest, size).
fn bucket_results(
    results: Vec<(FileRecord, Result<Hash, HashError>)>,
    mode: DigestMode,
    stats: &mut PhaseStats,
) -> HashMap<GroupKey, Vec<FileRecord>> {
    let mut buckets: HashMap<GroupKey, Vec<FileRecord>> = HashMap::new();
    for (file, result) in results {
        match result {
            Ok(digest) => {
                stats.hashed_files += 1;
                stats.bytes_hashed += match mode {
                    DigestMode::Prefix => file.size.min(crate::scanner::PREFIX_SIZE as u64),
                    DigestMode::Full => file.size,
                };
                buckets
                    .entry(GroupKey::new(digest, file.size))
                    .or_default()
                    .push(file);
            }
            Err(HashError::Interrupted(_)) => stats.interrupted = true,
            Err(e) => {
                stats.failed_files += 1;
                stats.errors.push(e);
            }
        }
    }

    buckets.retain(|_, files| files.len() > 1);
    stats.duplicate_groups = buckets.len();
    stats.potential_duplicates = buckets.values().map(Vec::len).sum();
    buckets
}

/// Group same-size files by the digest of their first 1024 bytes (Phase 2).
///
/// Size buckets with fewer than two members are skipped without any I/O.
/// A file that cannot be read is excluded and logged; the rest of its
/// bucket is unaffected. Only buckets that still hold 2+ files are returned.
#[must_use]
pub fn phase2_prefix(
    size_groups: SizeGroups,
    hasher: Arc<Hasher>,
    config: HashPhaseConfig,
) -> (PrefixGroups, PhaseStats) {
    let mut stats = PhaseStats::default();
    let buckets: Vec<Vec<FileRecord>> = size_groups.into_values().collect();

    let results = hash_candidates(
        buckets,
        &hasher,
        DigestMode::Prefix,
        "prefix",
        &config,
        &mut stats,
    );
    if stats.input_files > 0 {
        log::info!(
            "Phase 2: Prefix hashing {} of {} files",
            results.len(),
            stats.input_files
        );
    }
    let groups = bucket_results(results, DigestMode::Prefix, &mut stats);
    if config.is_shutdown_requested() {
        stats.interrupted = true;
    }

    for (key, files) in &groups {
        log::debug!(
            "Prefix group {} ({} bytes): {} candidates",
            hash_to_hex(&key.digest),
            key.size,
            files.len()
        );
    }
    log::info!(
        "Phase 2 complete: {} files → {} candidates in {} groups ({} failed)",
        stats.input_files,
        stats.potential_duplicates,
        stats.duplicate_groups,
        stats.failed_files
    );

    (groups, stats)
}

/// Confirm duplicates by digesting entire file contents (Phase 3).
///
/// Prefix buckets with fewer than two members are skipped. The returned
/// groups all have 2+ byte-identical members and are ordered by size
/// (largest first), then by first path.
#[must_use]
pub fn phase3_full(
    prefix_groups: PrefixGroups,
    hasher: Arc<Hasher>,
    config: HashPhaseConfig,
) -> (Vec<DuplicateGroup>, PhaseStats) {
    let mut stats = PhaseStats::default();
    let buckets: Vec<Vec<FileRecord>> = prefix_groups.into_values().collect();

    let results = hash_candidates(
        buckets,
        &hasher,
        DigestMode::Full,
        "full",
        &config,
        &mut stats,
    );
    if !results.is_empty() {
        log::info!("Phase 3: Computing full hashes for {} files", results.len());
    }
    let buckets = bucket_results(results, DigestMode::Full, &mut stats);
    if config.is_shutdown_requested() {
        stats.interrupted = true;
    }

    let mut groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .map(|(key, files)| {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                hash_to_hex(&key.digest),
                files.len(),
                key.size
            );
            DuplicateGroup::new(key, files)
        })
        .collect();
    groups.sort_by(|a, b| {
        b.size()
            .cmp(&a.size())
            .then_with(|| a.files[0].path.cmp(&b.files[0].path))
    });

    log::info!(
        "Phase 3 complete: {} groups, {} duplicates ({} failed)",
        stats.duplicate_groups,
        stats.duplicate_files(),
        stats.failed_files
    );

    (groups, stats)
}

// ============================================================================
// DuplicateFinder - Pipeline Orchestrator
// ============================================================================

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing.
    pub io_threads: usize,
    /// Digest algorithm, fixed for the whole run.
    pub algorithm: HashAlgorithm,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("algorithm", &self.algorithm)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            algorithm: HashAlgorithm::default(),
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the I/O thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn phase_config(&self) -> HashPhaseConfig {
        HashPhaseConfig {
            io_threads: self.io_threads,
            shutdown_flag: self.shutdown_flag.clone(),
            progress_callback: self.progress_callback.clone(),
        }
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// The roots actually walked
    pub roots: Vec<PathBuf>,
    /// Total number of distinct files indexed
    pub total_files: usize,
    /// Total size of all indexed files in bytes
    pub total_size: u64,
    /// Files eliminated by size grouping (unique sizes)
    pub eliminated_by_size: usize,
    /// Files eliminated by the prefix digest
    pub eliminated_by_prefix: usize,
    /// Files excluded because they could not be read
    pub failed_files: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of redundant copies (excluding one per group)
    pub duplicate_files: usize,
    /// Space that removing every redundant copy would reclaim
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Non-fatal errors encountered during the scan
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Errors that stop a scan.
///
/// Anything that only affects a single file is reported through
/// [`ScanSummary::scan_errors`] instead.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// No roots were supplied.
    #[error("No directories to scan")]
    NoRoots,

    /// A scan root does not exist.
    #[error("Path not found: {0}")]
    RootNotFound(PathBuf),

    /// A scan root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A scan root exists but cannot be listed.
    #[error("Cannot read directory {path}: {source}")]
    RootUnreadable {
        /// The root that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Check that a scan root exists, is a directory and can be listed.
///
/// Returns the canonical path of the root.
///
/// # Errors
///
/// Returns the matching [`FinderError`] variant; these abort the run before
/// any indexing begins.
pub fn validate_root(path: &Path) -> Result<PathBuf, FinderError> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FinderError::RootNotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(FinderError::RootUnreadable {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if !metadata.is_dir() {
        return Err(FinderError::NotADirectory(path.to_path_buf()));
    }
    fs::read_dir(path).map_err(|source| FinderError::RootUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    fs::canonicalize(path).map_err(|source| FinderError::RootUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

/// Duplicate finder that orchestrates the multi-phase detection pipeline.
///
/// ```no_run
/// use prunedupe::duplicates::{DuplicateFinder, FinderConfig};
/// use std::path::PathBuf;
///
/// let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(8));
/// let (groups, summary) = finder
///     .find_duplicates_in_paths(&[PathBuf::from("/backup/a"), PathBuf::from("/backup/b")])
///     .unwrap();
/// println!("{} groups, {} reclaimable", groups.len(), summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new().with_algorithm(config.algorithm);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find duplicates under a single root.
    ///
    /// # Errors
    ///
    /// See [`DuplicateFinder::find_duplicates_in_paths`].
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        self.find_duplicates_in_paths(&[path.to_path_buf()])
    }

    /// Find duplicates across several roots.
    ///
    /// Every root is validated before the walk starts. Files reachable from
    /// more than one root (or via links) are indexed once.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if no roots are given, a root is missing,
    /// not a directory or unreadable, or the scan is interrupted.
    pub fn find_duplicates_in_paths(
        &self,
        paths: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();

        if paths.is_empty() {
            return Err(FinderError::NoRoots);
        }
        let roots = paths
            .iter()
            .map(|p| validate_root(p))
            .collect::<Result<Vec<_>, _>>()?;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut walker = MultiWalker::new(roots, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        log::info!(
            "Scanning {} directory root(s): {:?}",
            walker.roots().len(),
            walker.roots().iter().map(|p| p.display()).collect::<Vec<_>>()
        );

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }
        let mut records = Vec::new();
        let mut scan_errors = Vec::new();
        for (idx, result) in walker.walk().enumerate() {
            match result {
                Ok(record) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(idx + 1, record.path.to_string_lossy().as_ref());
                    }
                    records.push(record);
                }
                Err(e) => scan_errors.push(e),
            }
        }
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let (groups, mut summary) = self.find_duplicates_from_records(records)?;
        summary.roots = walker.roots().to_vec();
        summary.failed_files += scan_errors.len();
        scan_errors.append(&mut summary.scan_errors);
        summary.scan_errors = scan_errors;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    /// Run phases 1-3 over records that were already discovered.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if shutdown is requested.
    pub fn find_duplicates_from_records(
        &self,
        records: Vec<FileRecord>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        // Phase 1: Group by size
        let (size_groups, size_stats) = group_by_size(records);
        summary.total_files = size_stats.total_files;
        summary.total_size = size_stats.total_size;
        summary.eliminated_by_size = size_stats.eliminated_unique;
        log::info!(
            "Phase 1 complete: {} files ({}) → {} candidates ({:.1}% eliminated)",
            size_stats.total_files,
            summary.total_size_display(),
            size_stats.potential_duplicates,
            size_stats.elimination_rate()
        );

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Phase 2: Prefix digests
        let (prefix_groups, prefix_stats) = phase2_prefix(
            size_groups,
            self.hasher.clone(),
            self.config.phase_config(),
        );
        summary.eliminated_by_prefix = prefix_stats.hashed_files - prefix_stats.potential_duplicates;
        summary.failed_files += prefix_stats.failed_files;
        summary
            .scan_errors
            .extend(prefix_stats.errors.into_iter().map(ScanError::from));

        if prefix_stats.interrupted || self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Phase 3: Full digests
        let (groups, full_stats) =
            phase3_full(prefix_groups, self.hasher.clone(), self.config.phase_config());
        summary.failed_files += full_stats.failed_files;
        summary
            .scan_errors
            .extend(full_stats.errors.into_iter().map(ScanError::from));

        if full_stats.interrupted || self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok((groups, summary))
    }
}
