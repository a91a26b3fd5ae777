//! Progress reporting using indicatif.
//!
//! [`ProgressCallback`] is the hook the finder calls during each phase
//! (`walking`, `prefix`, `full`); [`Progress`] draws one bar per phase and
//! also reports deletion batches through [`DeleteProgressCallback`].

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::actions::delete::{BatchDeleteResult, DeleteProgressCallback};

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates during
/// the duplicate detection pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// `total` is 0 when the number of items is not known in advance.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to replace the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter drawing to stderr.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter. A quiet reporter draws nothing.
    ///
    /// ```
    /// use prunedupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn start(&self, total: usize, message: &str) {
        if self.quiet {
            return;
        }
        let bar = if total == 0 {
            let bar = ProgressBar::new_spinner().with_style(Self::spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::new(total as u64).with_style(Self::bar_style())
        };
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.set_message(message.to_string());
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if self.quiet {
            return;
        }
        if let Ok(slot) = self.bar.lock() {
            if let Some(ref bar) = *slot {
                f(bar);
            }
        }
    }

    fn finish(&self, message: &str) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_with_message(message.to_string());
            }
        }
    }
}

fn phase_label(phase: &str) -> &str {
    match phase {
        "walking" => "Walking directories",
        "prefix" => "Comparing first 1 KiB",
        "full" => "Comparing full contents",
        other => other,
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        self.start(total, phase_label(phase));
    }

    fn on_progress(&self, current: usize, path: &str) {
        self.with_bar(|bar| {
            bar.set_position(current as u64);
            bar.set_message(truncate_path(path, 30));
        });
    }

    fn on_phase_end(&self, phase: &str) {
        self.finish(&format!("{} complete", phase_label(phase)));
    }

    fn on_message(&self, message: &str) {
        self.with_bar(|bar| bar.set_message(message.to_string()));
    }
}

impl DeleteProgressCallback for Progress {
    fn on_before_delete(&self, path: &Path, index: usize, total: usize) {
        if index == 0 {
            self.start(total, "Deleting");
        }
        self.with_bar(|bar| {
            bar.set_position(index as u64);
            bar.set_message(truncate_path(&path.to_string_lossy(), 30));
        });
    }

    fn on_delete_success(&self, _path: &Path, _size: u64) {}

    fn on_delete_failure(&self, path: &Path, error: &str) {
        self.with_bar(|bar| bar.println(format!("Failed: {} ({})", path.display(), error)));
    }

    fn on_complete(&self, result: &BatchDeleteResult) {
        self.finish(&result.summary());
    }
}

/// Shorten a path to its file name when it is too long to display.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
