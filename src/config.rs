//! Layered configuration.
//!
//! Values are resolved in this order (later wins):
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, or `config.toml` in the platform config
//!    directory)
//! 3. Environment variables prefixed with `PRUNEDUPE_` (nested keys use
//!    `__`, e.g. `PRUNEDUPE_WALKER__SKIP_HIDDEN=true`)
//! 4. Command-line flags
//!
//! The merged [`Config`] is then turned into a [`RunConfig`], the explicit
//! object the pipeline runs from.
//!
//! ```toml
//! mode = "delete"
//! protected_root = "/home/me/photos"
//! removable_root = "/mnt/backup/photos"
//! algorithm = "sha256"
//! io_threads = 2
//! delete_method = "trash"
//!
//! [walker]
//! skip_hidden = true
//! min_size = 1024
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::delete::DeleteMethod;
use crate::actions::reaper::DEFAULT_REAP_PASSES;
use crate::actions::retention::RootDesignation;
use crate::cli::{Mode, ScanArgs};
use crate::scanner::{HashAlgorithm, WalkerConfig};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PRUNEDUPE_";

/// Configuration errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file or environment could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] Box<figment::Error>),

    /// Delete mode was requested without a removable root.
    #[error("delete mode requires a removable root (--removable)")]
    MissingRemovableRoot,

    /// No directory to scan.
    #[error("no directories to scan: give a PATH, --protected or --removable")]
    NoRoots,

    /// `io_threads` was zero.
    #[error("io_threads must be at least 1")]
    ZeroIoThreads,

    /// `reap_passes` was zero.
    #[error("reap_passes must be at least 1")]
    ZeroReapPasses,

    /// The size filter excludes everything.
    #[error("min_size ({min}) is larger than max_size ({max})")]
    InvalidSizeRange { min: u64, max: u64 },
}

/// Settings that can come from the file, the environment or the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to do with duplicates.
    pub mode: Mode,
    /// Root whose files are never deleted.
    pub protected_root: Option<PathBuf>,
    /// Root whose files may be deleted.
    pub removable_root: Option<PathBuf>,
    /// Content digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Hashing threads.
    pub io_threads: usize,
    /// Maximum empty-directory reaping passes.
    pub reap_passes: usize,
    /// How redundant copies are removed.
    pub delete_method: DeleteMethod,
    /// Plan deletions without applying them.
    pub dry_run: bool,
    /// Traversal filters.
    pub walker: WalkerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Report,
            protected_root: None,
            removable_root: None,
            algorithm: HashAlgorithm::default(),
            io_threads: 4,
            reap_passes: DEFAULT_REAP_PASSES,
            delete_method: DeleteMethod::default(),
            dry_run: false,
            walker: WalkerConfig::default(),
        }
    }
}

impl Config {
    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "prunedupe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the figment for a given file (which may not exist).
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load defaults, the given file and the environment.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the file or environment is invalid.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading configuration from {}", path.display());
        Self::figment(Some(path))
            .extract()
            .map_err(|e| ConfigError::Parse(Box::new(e)))
    }

    /// Load using `explicit` if given, else the default location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the file or environment is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load_from_path(&path),
            None => Self::figment(None)
                .extract()
                .map_err(|e| ConfigError::Parse(Box::new(e))),
        }
    }

    /// Apply flags given on the command line.
    pub fn merge_cli(&mut self, args: &ScanArgs) {
        if let Some(mode) = args.mode {
            self.mode = mode;
        }
        if let Some(ref protected) = args.protected {
            self.protected_root = Some(protected.clone());
        }
        if let Some(ref removable) = args.removable {
            self.removable_root = Some(removable.clone());
        }
        if let Some(algorithm) = args.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if let Some(passes) = args.reap_passes {
            self.reap_passes = passes;
        }
        if args.trash {
            self.delete_method = DeleteMethod::Trash;
        }
        if args.dry_run {
            self.dry_run = true;
        }
        if args.skip_hidden {
            self.walker.skip_hidden = true;
        }
        if args.min_size.is_some() {
            self.walker.min_size = args.min_size;
        }
        if args.max_size.is_some() {
            self.walker.max_size = args.max_size;
        }
    }

    /// Resolve into a validated [`RunConfig`] scanning `paths` plus the roots.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn into_run_config(self, paths: &[PathBuf]) -> Result<RunConfig, ConfigError> {
        let mut roots: Vec<PathBuf> = Vec::new();
        for root in paths
            .iter()
            .chain(self.protected_root.iter())
            .chain(self.removable_root.iter())
        {
            if !roots.contains(root) {
                roots.push(root.clone());
            }
        }

        let run = RunConfig {
            roots,
            protected_root: self.protected_root,
            removable_root: self.removable_root,
            mode: self.mode,
            dry_run: self.dry_run,
            algorithm: self.algorithm,
            io_threads: self.io_threads,
            reap_passes: self.reap_passes,
            delete_method: self.delete_method,
            walker: self.walker,
        };
        run.validate()?;
        Ok(run)
    }
}

/// The resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Directories to scan, in order, without repeats.
    pub roots: Vec<PathBuf>,
    /// Root whose files are never deleted.
    pub protected_root: Option<PathBuf>,
    /// Root whose files may be deleted.
    pub removable_root: Option<PathBuf>,
    /// What to do with duplicates.
    pub mode: Mode,
    /// Plan deletions without applying them.
    pub dry_run: bool,
    /// Content digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Hashing threads.
    pub io_threads: usize,
    /// Maximum empty-directory reaping passes.
    pub reap_passes: usize,
    /// How redundant copies are removed.
    pub delete_method: DeleteMethod,
    /// Traversal filters.
    pub walker: WalkerConfig,
}

impl RunConfig {
    /// Check the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }
        if self.mode == Mode::Delete && self.removable_root.is_none() {
            return Err(ConfigError::MissingRemovableRoot);
        }
        if self.io_threads == 0 {
            return Err(ConfigError::ZeroIoThreads);
        }
        if self.reap_passes == 0 {
            return Err(ConfigError::ZeroReapPasses);
        }
        if let (Some(min), Some(max)) = (self.walker.min_size, self.walker.max_size) {
            if min > max {
                return Err(ConfigError::InvalidSizeRange { min, max });
            }
        }
        Ok(())
    }

    /// Retention roots, when a removable root is configured.
    #[must_use]
    pub fn root_designation(&self) -> Option<RootDesignation> {
        self.removable_root
            .as_ref()
            .map(|removable| RootDesignation::new(self.protected_root.clone(), removable.clone()))
    }
}
