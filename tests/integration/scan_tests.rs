use prunedupe::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use prunedupe::scanner::{HashAlgorithm, WalkerConfig, PREFIX_SIZE};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"content a");
    write(&dir.path().join("b.txt"), b"content b");
    write(&dir.path().join("c.txt"), b"content c");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_duplicate_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"duplicate");
    write(&dir.path().join("b.txt"), b"duplicate");
    write(&dir.path().join("c.txt"), b"unique!!!");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 9);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"dup");
    write(&dir.path().join("subdir/deeper/b.txt"), b"dup");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
    assert_eq!(summary.total_files, 2);
}

#[test]
fn test_groups_partition_exact_duplicates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("1a.txt"), b"group1");
    write(&dir.path().join("1b.txt"), b"group1");
    write(&dir.path().join("x/1c.txt"), b"group1");
    write(&dir.path().join("2a.txt"), b"group2");
    write(&dir.path().join("y/2b.txt"), b"group2");
    write(&dir.path().join("lonely.txt"), b"group3");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(summary.duplicate_files, 3);

    let mut seen = HashSet::new();
    for group in &groups {
        let first = fs::read(&group.files[0].path).unwrap();
        for file in &group.files {
            assert_eq!(fs::read(&file.path).unwrap(), first);
            assert!(seen.insert(file.path.clone()), "path in two groups");
        }
    }
    assert!(!seen.iter().any(|p: &PathBuf| p.ends_with("lonely.txt")));
}

#[test]
fn test_same_size_different_prefix_not_grouped() {
    let dir = tempdir().unwrap();
    let mut a = vec![b'a'; 4096];
    let mut b = vec![b'a'; 4096];
    a[10] = b'x';
    b[10] = b'y';
    write(&dir.path().join("a.bin"), &a);
    write(&dir.path().join("b.bin"), &b);

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.eliminated_by_prefix, 2);
}

#[test]
fn test_same_prefix_different_tail_not_grouped() {
    let dir = tempdir().unwrap();
    let mut a = vec![7u8; PREFIX_SIZE * 3];
    let b = a.clone();
    *a.last_mut().unwrap() = 8;
    write(&dir.path().join("a.bin"), &a);
    write(&dir.path().join("b.bin"), &b);

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.eliminated_by_prefix, 0);
}

#[test]
fn test_short_identical_files_grouped() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"short");
    write(&dir.path().join("b.txt"), b"short");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size(), 5);
}

#[test]
fn test_empty_files_form_a_group() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("e1"), b"");
    write(&dir.path().join("e2"), b"");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size(), 0);

    let walker = WalkerConfig {
        skip_empty: true,
        ..WalkerConfig::default()
    };
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
}

#[test]
fn test_scan_size_filtering() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("10a.txt"), b"0123456789");
    write(&dir.path().join("10b.txt"), b"0123456789");
    write(&dir.path().join("20a.txt"), b"01234567890123456789");
    write(&dir.path().join("20b.txt"), b"01234567890123456789");

    let walker = WalkerConfig {
        min_size: Some(15),
        ..WalkerConfig::default()
    };
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker));

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size(), 20);
}

#[test]
fn test_skip_hidden() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("visible.txt"), b"same");
    write(&dir.path().join(".hidden.txt"), b"same");
    write(&dir.path().join(".cache/inner.txt"), b"same");

    let walker = WalkerConfig {
        skip_hidden: true,
        ..WalkerConfig::default()
    };
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.total_files, 1);
    assert!(groups.is_empty());
}

#[test]
fn test_duplicates_across_roots() {
    let left = tempdir().unwrap();
    let right = tempdir().unwrap();
    write(&left.path().join("photo.jpg"), b"jpeg bytes");
    write(&right.path().join("copy/photo.jpg"), b"jpeg bytes");
    write(&right.path().join("other.jpg"), b"other bytes");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[left.path().to_path_buf(), right.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.roots.len(), 2);
    assert_eq!(summary.total_files, 3);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn test_overlapping_roots_index_files_once() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"one");
    write(&dir.path().join("sub/b.txt"), b"two");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[
            dir.path().to_path_buf(),
            dir.path().join("sub"),
            dir.path().to_path_buf(),
        ])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert!(groups.is_empty());
}

#[test]
fn test_sha256_finds_same_groups() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"payload");
    write(&dir.path().join("b"), b"payload");
    write(&dir.path().join("c"), b"payloaD");

    let blake = DuplicateFinder::with_defaults();
    let sha = DuplicateFinder::new(FinderConfig::default().with_algorithm(HashAlgorithm::Sha256));

    let (blake_groups, _) = blake.find_duplicates(dir.path()).unwrap();
    let (sha_groups, _) = sha.find_duplicates(dir.path()).unwrap();

    assert_eq!(blake_groups.len(), 1);
    assert_eq!(sha_groups.len(), 1);
    assert_eq!(blake_groups[0].paths(), sha_groups[0].paths());
    assert_ne!(blake_groups[0].hash_hex(), sha_groups[0].hash_hex());
}

#[test]
fn test_single_io_thread() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write(&dir.path().join(format!("f{i}.txt")), format!("{}", i % 5).as_bytes());
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(1));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 5);
    assert_eq!(summary.duplicate_files, 15);
}

#[test]
fn test_missing_root_is_fatal() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let result = finder.find_duplicates(&dir.path().join("does-not-exist"));

    assert!(matches!(result, Err(FinderError::RootNotFound(_))));
}

#[test]
fn test_file_root_is_fatal() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    write(&file, b"x");
    let finder = DuplicateFinder::with_defaults();

    let result = finder.find_duplicates_in_paths(&[dir.path().to_path_buf(), file]);

    assert!(matches!(result, Err(FinderError::NotADirectory(_))));
}

#[test]
fn test_no_roots_is_fatal() {
    let finder = DuplicateFinder::with_defaults();
    assert!(matches!(
        finder.find_duplicates_in_paths(&[]),
        Err(FinderError::NoRoots)
    ));
}
