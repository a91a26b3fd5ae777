//! Human-readable text output.
//!
//! Report mode lists each duplicate group; delete mode prints, per group,
//! how many copies were found, deleted and kept, followed by the kept paths.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Paint, Style};

use crate::actions::prune::PruneReport;
use crate::duplicates::{DuplicateGroup, ScanSummary};

const HEADER: Style = Style::new().bold();
const KEEP: Style = Style::new().green();
const DELETE: Style = Style::new().red();
const WARN: Style = Style::new().yellow();
const DIM: Style = Style::new().dim();

/// Text writer with optional colour.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput {
    color: bool,
}

impl TextOutput {
    /// Create a writer; `color` enables ANSI styling.
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Print every duplicate group and the scan totals.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_report<W: Write>(
        &self,
        writer: &mut W,
        groups: &[DuplicateGroup],
        summary: &ScanSummary,
    ) -> io::Result<()> {
        for (idx, group) in groups.iter().enumerate() {
            let header = format!(
                "[{}] {} files, {} each",
                idx + 1,
                group.len(),
                ByteSize::b(group.size())
            );
            let hash = group.hash_hex();
            writeln!(
                writer,
                "{} {}",
                self.paint(&header, HEADER),
                self.paint(&format!("({})", &hash[..16]), DIM)
            )?;
            for path in group.paths() {
                writeln!(writer, "    {}", path.display())?;
            }
            writeln!(writer)?;
        }
        self.write_scan_summary(writer, summary)
    }

    fn write_scan_summary<W: Write>(&self, writer: &mut W, summary: &ScanSummary) -> io::Result<()> {
        writeln!(
            writer,
            "Scanned {} files ({}) in {:.2}s",
            summary.total_files,
            summary.total_size_display(),
            summary.scan_duration.as_secs_f64()
        )?;
        writeln!(
            writer,
            "{}",
            self.paint(
                &format!(
                    "Found {} duplicate groups, {} redundant copies, {} reclaimable",
                    summary.duplicate_groups,
                    summary.duplicate_files,
                    summary.reclaimable_display()
                ),
                HEADER
            )
        )?;
        if summary.failed_files > 0 {
            writeln!(
                writer,
                "{}",
                self.paint(
                    &format!("{} files could not be read (see log)", summary.failed_files),
                    WARN
                )
            )?;
        }
        Ok(())
    }

    /// Print per-group retention outcomes and run totals.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_prune<W: Write>(
        &self,
        writer: &mut W,
        report: &PruneReport,
        summary: &ScanSummary,
    ) -> io::Result<()> {
        let verb = if report.dry_run { "to delete" } else { "deleted" };

        for group in &report.groups {
            writeln!(
                writer,
                "{}",
                self.paint(
                    &format!(
                        "{} duplicates found, {} {}, {} kept",
                        group.duplicates(),
                        group.deleted(report.dry_run),
                        verb,
                        group.kept()
                    ),
                    HEADER
                )
            )?;
            for path in &group.decision.keep {
                writeln!(writer, "  {} {}", self.paint("Keeping:", KEEP), path.display())?;
            }
            if report.dry_run {
                for path in &group.decision.delete {
                    writeln!(writer, "  {} {}", self.paint("Would delete:", DELETE), path.display())?;
                }
            }
            for failure in &group.result.failures {
                writeln!(
                    writer,
                    "  {} {} ({})",
                    self.paint("Failed:", WARN),
                    failure.path.display(),
                    failure.reason
                )?;
            }
        }

        if !report.groups.is_empty() {
            writeln!(writer)?;
        }
        writeln!(
            writer,
            "{}",
            self.paint(
                &format!(
                    "Total: {} duplicates found, {} {}, {} kept, {} failed, {} {}",
                    report.total_duplicates(),
                    report.total_deleted(),
                    verb,
                    report.total_kept(),
                    report.total_failed(),
                    ByteSize::b(report.bytes_freed()),
                    if report.dry_run { "to free" } else { "freed" }
                ),
                HEADER
            )
        )?;
        if report.reap.removed_count() > 0 || !report.reap.failures.is_empty() {
            writeln!(
                writer,
                "Removed {} empty directories ({} could not be removed)",
                report.reap.removed_count(),
                report.reap.failures.len()
            )?;
        }
        if summary.failed_files > 0 {
            writeln!(
                writer,
                "{}",
                self.paint(
                    &format!("{} files could not be read (see log)", summary.failed_files),
                    WARN
                )
            )?;
        }
        Ok(())
    }
}
