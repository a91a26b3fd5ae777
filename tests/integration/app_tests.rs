use clap::Parser;
use prunedupe::cli::Cli;
use prunedupe::duplicates::FinderError;
use prunedupe::error::ExitCode;
use prunedupe::run_app_with_writer;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

use crate::ENV_MUTEX;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

struct Fixture {
    dir: TempDir,
    protected: PathBuf,
    removable: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let base = dir.path().canonicalize().unwrap();
        let protected = base.join("a");
        let removable = base.join("b");
        fs::create_dir_all(&protected).unwrap();
        fs::create_dir_all(&removable).unwrap();
        Self {
            dir,
            protected,
            removable,
        }
    }

    /// Run the CLI with a config file that does not exist.
    fn run(&self, args: &[&str]) -> anyhow::Result<(ExitCode, String)> {
        let config = self.dir.path().join("no-config.toml");
        let mut argv = vec![
            "prunedupe".to_string(),
            "-q".to_string(),
            "--config".to_string(),
            config.to_string_lossy().into_owned(),
            "scan".to_string(),
        ];
        argv.extend(args.iter().map(|s| s.to_string()));
        let cli = Cli::try_parse_from(argv).unwrap();

        let mut out = Vec::new();
        let code = run_app_with_writer(cli, &mut out, false)?;
        Ok((code, String::from_utf8(out).unwrap()))
    }

    fn p(&self) -> String {
        self.protected.to_string_lossy().into_owned()
    }

    fn r(&self) -> String {
        self.removable.to_string_lossy().into_owned()
    }
}

#[test]
fn test_report_mode_lists_groups_and_deletes_nothing() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let f = Fixture::new();
    write(&f.protected.join("x.txt"), b"hello");
    write(&f.removable.join("x.txt"), b"hello");

    let (code, out) = f.run(&[&f.p(), &f.r()]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(out.contains(&f.protected.join("x.txt").display().to_string()));
    assert!(out.contains(&f.removable.join("x.txt").display().to_string()));
    assert!(out.contains("Found 1 duplicate groups"));
    assert!(f.removable.join("x.txt").exists());
}

#[test]
fn test_delete_mode_summary_lines() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let f = Fixture::new();
    write(&f.protected.join("x.txt"), b"hello");
    write(&f.removable.join("x.txt"), b"hello");
    write(&f.removable.join("y.txt"), b"world");

    let (code, out) = f
        .run(&[
            "--protected",
            &f.p(),
            "--removable",
            &f.r(),
            "--mode",
            "delete",
        ])
        .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("2 duplicates found, 1 deleted, 1 kept"));
    assert!(out.contains(&format!("Keeping: {}", f.protected.join("x.txt").display())));
    assert!(!f.removable.join("x.txt").exists());
    assert!(f.removable.join("y.txt").exists());
}

#[test]
fn test_delete_mode_is_idempotent() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let f = Fixture::new();
    write(&f.protected.join("x.txt"), b"hello");
    write(&f.removable.join("dir/x.txt"), b"hello");
    let args = [
        "--protected".to_string(),
        f.p(),
        "--removable".to_string(),
        f.r(),
        "--mode".to_string(),
        "delete".to_string(),
    ];
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    f.run(&args).unwrap();
    let (_, out) = f.run(&args).unwrap();

    assert!(out.contains("Total: 0 duplicates found, 0 deleted, 0 kept, 0 failed"));
    assert!(f.protected.join("x.txt").exists());
    assert!(!f.removable.join("dir").exists());
}

#[test]
fn test_dry_run_json_output() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let f = Fixture::new();
    write(&f.protected.join("x.txt"), b"hello");
    write(&f.removable.join("x.txt"), b"hello");

    let (_, out) = f
        .run(&[
            "--protected",
            &f.p(),
            "--removable",
            &f.r(),
            "--mode",
            "delete",
            "--dry-run",
            "--output",
            "json",
        ])
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["prune"]["dry_run"], true);
    assert_eq!(value["prune"]["totals"]["deleted"], 1);
    assert_eq!(value["summary"]["duplicate_groups"], 1);
    assert!(f.removable.join("x.txt").exists());
}

#[test]
fn test_relative_roots_are_resolved() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let f = Fixture::new();
    write(&f.protected.join("x.txt"), b"hello");
    write(&f.removable.join("x.txt"), b"hello");
    let removable_with_dots = f.removable.join("..").join("b");

    let (_, out) = f
        .run(&[
            "--protected",
            &f.p(),
            "--removable",
            &removable_with_dots.to_string_lossy(),
            "--mode",
            "delete",
        ])
        .unwrap();

    assert!(out.contains("1 deleted"));
    assert!(!f.removable.join("x.txt").exists());
}

#[test]
fn test_delete_mode_requires_removable() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let f = Fixture::new();

    let err = f
        .run(&["--protected", &f.p(), "--mode", "delete"])
        .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{:#}", err).contains("removable"));
}

#[test]
fn test_missing_root_is_fatal() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let f = Fixture::new();
    let missing = f.dir.path().join("missing");
    write(&f.removable.join("x.txt"), b"hello");

    let err = f
        .run(&[&missing.to_string_lossy(), "--removable", &f.r(), "--mode", "delete"])
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::RootNotFound(_))
    ));
    assert_eq!(ExitCode::for_error(&err).code_prefix(), "PD001");
    assert!(f.removable.join("x.txt").exists());
}
