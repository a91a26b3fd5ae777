//! prunedupe - Duplicate File Finder and Pruner
//!
//! Finds files with identical content across one or more directory trees
//! (size, then a 1 KiB prefix digest, then a full digest) and, in delete
//! mode, removes redundant copies under a removable root while keeping every
//! copy under a protected root.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::actions::prune::{prune_duplicates, PruneOptions};
use crate::actions::retention::RootDesignation;
use crate::cli::{Cli, Commands, Mode, OutputFormat, ScanArgs};
use crate::config::{Config, RunConfig};
use crate::duplicates::{validate_root, DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run the command described by `cli`, printing results to stdout.
///
/// # Errors
///
/// Returns an error for bad configuration, unusable roots, interruption
/// or a failure to write results.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let stdout = std::io::stdout();
    let color = !cli.no_color && stdout.is_terminal();
    let mut handle = stdout.lock();
    run_app_with_writer(cli, &mut handle, color)
}

/// Run the command described by `cli`, printing results to `writer`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_app_with_writer<W: Write>(
    cli: Cli,
    writer: &mut W,
    color: bool,
) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let Cli {
        quiet,
        no_color,
        config,
        command,
        ..
    } = cli;

    match command {
        Commands::Scan(args) => {
            let run = resolve_config(config.as_deref(), &args)?;
            let quiet_progress = quiet || args.output == OutputFormat::Json;
            handle_scan(&run, args.output, quiet_progress, color && !no_color, writer)
        }
    }
}

/// Layer defaults, file, environment and flags into a validated run config.
fn resolve_config(path: Option<&std::path::Path>, args: &ScanArgs) -> anyhow::Result<RunConfig> {
    let mut config = Config::load(path).context("Failed to load configuration")?;
    config.merge_cli(args);
    let run = config
        .into_run_config(&args.paths)
        .context("Invalid configuration")?;
    log::debug!("Resolved configuration: {:?}", run);
    Ok(run)
}

/// Retention roots in the canonical form the walker reports paths in.
fn resolve_designation(run: &RunConfig) -> anyhow::Result<RootDesignation> {
    let designation = run
        .root_designation()
        .context("Delete mode requires a removable root")?;
    let protected = designation
        .protected
        .as_deref()
        .map(validate_root)
        .transpose()?;
    let removable = validate_root(&designation.removable)?;
    Ok(RootDesignation::new(protected, removable))
}

fn handle_scan<W: Write>(
    run: &RunConfig,
    format: OutputFormat,
    quiet_progress: bool,
    color: bool,
    writer: &mut W,
) -> anyhow::Result<ExitCode> {
    let shutdown = signal::install_handler();
    let progress = Arc::new(Progress::new(quiet_progress));

    let finder_config = FinderConfig::default()
        .with_io_threads(run.io_threads)
        .with_algorithm(run.algorithm)
        .with_walker_config(run.walker.clone())
        .with_shutdown_flag(shutdown.flag())
        .with_progress_callback(progress.clone());
    let finder = DuplicateFinder::new(finder_config);

    let (groups, summary) = finder
        .find_duplicates_in_paths(&run.roots)
        .context("Scan failed")?;

    for error in &summary.scan_errors {
        log::warn!("{}", error);
    }

    match run.mode {
        Mode::Report => match format {
            OutputFormat::Text => TextOutput::new(color)
                .write_report(writer, &groups, &summary)
                .context("Failed to write report")?,
            OutputFormat::Json => JsonOutput::new(&groups, &summary, ExitCode::Success)
                .write_to(writer, true)
                .context("Failed to write JSON report")?,
        },
        Mode::Delete => {
            let roots = resolve_designation(run)?;
            let options = PruneOptions::default()
                .with_method(run.delete_method)
                .with_dry_run(run.dry_run)
                .with_reap_passes(run.reap_passes);

            let report = prune_duplicates(&groups, &roots, &options, Some(progress.as_ref()))
                .context("Refusing to delete")?;

            for path in report.failed_paths() {
                log::warn!("Could not delete {}", path.display());
            }

            match format {
                OutputFormat::Text => TextOutput::new(color)
                    .write_prune(writer, &report, &summary)
                    .context("Failed to write summary")?,
                OutputFormat::Json => JsonOutput::new(&groups, &summary, ExitCode::Success)
                    .with_prune(&report)
                    .write_to(writer, true)
                    .context("Failed to write JSON summary")?,
            }
        }
    }

    Ok(ExitCode::Success)
}
