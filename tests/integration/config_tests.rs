use figment::providers::Serialized;
use prunedupe::actions::delete::DeleteMethod;
use prunedupe::cli::{Mode, ScanArgs};
use prunedupe::config::{Config, ConfigError};
use prunedupe::scanner::HashAlgorithm;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

use crate::ENV_MUTEX;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = figment::Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config.mode, Mode::Report);
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert_eq!(config.delete_method, DeleteMethod::Permanent);
    assert_eq!(config.io_threads, 4);
    assert_eq!(config.reap_passes, 10);
    assert!(config.protected_root.is_none());
}

#[test]
fn test_config_load_from_toml() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
mode = "delete"
protected_root = "/data/originals"
removable_root = "/data/backup"
algorithm = "sha256"
io_threads = 8
delete_method = "trash"

[walker]
skip_hidden = true
min_size = 100
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from_path(&config_path).unwrap();

    assert_eq!(config.mode, Mode::Delete);
    assert_eq!(config.protected_root, Some(PathBuf::from("/data/originals")));
    assert_eq!(config.removable_root, Some(PathBuf::from("/data/backup")));
    assert_eq!(config.algorithm, HashAlgorithm::Sha256);
    assert_eq!(config.io_threads, 8);
    assert_eq!(config.delete_method, DeleteMethod::Trash);
    assert!(config.walker.skip_hidden);
    assert_eq!(config.walker.min_size, Some(100));
    assert_eq!(config.reap_passes, 10);
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();

    let config = Config::load_from_path(&temp_dir.path().join("absent.toml")).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_invalid_toml_is_error() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "mode = \"purge\"\n").unwrap();

    let result = Config::load_from_path(&config_path);

    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_env_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 8\nreap_passes = 3\n").unwrap();

    std::env::set_var("PRUNEDUPE_IO_THREADS", "16");
    // Use double underscore for nesting
    std::env::set_var("PRUNEDUPE_WALKER__SKIP_EMPTY", "true");

    let result = Config::load_from_path(&config_path);

    std::env::remove_var("PRUNEDUPE_IO_THREADS");
    std::env::remove_var("PRUNEDUPE_WALKER__SKIP_EMPTY");

    let config = result.unwrap();
    assert_eq!(config.io_threads, 16);
    assert_eq!(config.reap_passes, 3);
    assert!(config.walker.skip_empty);
}

#[test]
fn test_cli_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "mode = \"report\"\nremovable_root = \"/from/file\"\nio_threads = 8\n",
    )
    .unwrap();

    let mut config = Config::load_from_path(&config_path).unwrap();
    config.merge_cli(&ScanArgs {
        mode: Some(Mode::Delete),
        removable: Some(PathBuf::from("/from/cli")),
        io_threads: Some(2),
        trash: true,
        dry_run: true,
        ..ScanArgs::default()
    });

    assert_eq!(config.mode, Mode::Delete);
    assert_eq!(config.removable_root, Some(PathBuf::from("/from/cli")));
    assert_eq!(config.io_threads, 2);
    assert_eq!(config.delete_method, DeleteMethod::Trash);
    assert!(config.dry_run);
}

#[test]
fn test_run_config_roots_are_union_of_paths_and_designated_roots() {
    let config = Config {
        protected_root: Some(PathBuf::from("/a")),
        removable_root: Some(PathBuf::from("/b")),
        ..Config::default()
    };

    let run = config
        .into_run_config(&[PathBuf::from("/c"), PathBuf::from("/a")])
        .unwrap();

    assert_eq!(
        run.roots,
        vec![PathBuf::from("/c"), PathBuf::from("/a"), PathBuf::from("/b")]
    );
    let designation = run.root_designation().unwrap();
    assert_eq!(designation.protected, Some(PathBuf::from("/a")));
    assert_eq!(designation.removable, PathBuf::from("/b"));
}

#[test]
fn test_run_config_validation() {
    let delete_without_removable = Config {
        mode: Mode::Delete,
        protected_root: Some(PathBuf::from("/a")),
        ..Config::default()
    };
    assert!(matches!(
        delete_without_removable.into_run_config(&[]),
        Err(ConfigError::MissingRemovableRoot)
    ));

    assert!(matches!(
        Config::default().into_run_config(&[]),
        Err(ConfigError::NoRoots)
    ));

    let zero_threads = Config {
        io_threads: 0,
        ..Config::default()
    };
    assert!(matches!(
        zero_threads.into_run_config(&[PathBuf::from("/x")]),
        Err(ConfigError::ZeroIoThreads)
    ));

    let mut inverted = Config::default();
    inverted.walker.min_size = Some(10);
    inverted.walker.max_size = Some(5);
    assert!(matches!(
        inverted.into_run_config(&[PathBuf::from("/x")]),
        Err(ConfigError::InvalidSizeRange { min: 10, max: 5 })
    ));
}
