//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (Phase 1)
//! - Prefix digest comparison (Phase 2)
//! - Full digest comparison (Phase 3)
//! - Duplicate group management

pub mod finder;
pub mod groups;

pub use finder::{
    phase2_prefix, phase3_full, validate_root, DuplicateFinder, FinderConfig, FinderError,
    HashPhaseConfig, PhaseStats, PrefixGroups, ScanSummary,
};
pub use groups::{group_by_size, DuplicateGroup, GroupKey, GroupingStats, SizeGroups};
