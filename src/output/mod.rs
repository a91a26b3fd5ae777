//! Output formatters for scan and prune results.
//!
//! - [`text`]: human-readable listing with optional colour
//! - [`json`]: machine-readable document for scripting
//!
//! # Example
//!
//! ```no_run
//! use prunedupe::duplicates::DuplicateFinder;
//! use prunedupe::error::ExitCode;
//! use prunedupe::output::json::JsonOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! let output = JsonOutput::new(&groups, &summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::JsonOutput;
pub use text::TextOutput;
