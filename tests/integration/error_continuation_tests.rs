use prunedupe::actions::delete::{delete_batch, DeleteMethod, NoDeleteProgress};
use prunedupe::duplicates::DuplicateFinder;
use prunedupe::scanner::{FileRecord, HashError, ScanError};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_unreadable_candidates_are_excluded_not_fatal() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, b"same size!").unwrap();
    fs::write(&b, b"same size!").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let records = vec![
        FileRecord::new(a.canonicalize().unwrap(), 10),
        FileRecord::new(b.canonicalize().unwrap(), 10),
        FileRecord::new(PathBuf::from("nonexistent_1.txt"), 10),
        FileRecord::new(PathBuf::from("nonexistent_2.txt"), 10),
    ];

    let (groups, summary) = finder.find_duplicates_from_records(records).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
    assert_eq!(summary.failed_files, 2);
    for err in &summary.scan_errors {
        match err {
            ScanError::Hash(HashError::NotFound(_)) => {}
            _ => panic!("Expected NotFound HashError, got: {:?}", err),
        }
    }
}

#[test]
fn test_delete_batch_continues_after_failure() {
    let dir = tempdir().unwrap();
    let present = dir.path().join("present.txt");
    fs::write(&present, b"data").unwrap();
    let paths = vec![dir.path().join("gone.txt"), present.clone()];

    let result = delete_batch(&paths, DeleteMethod::Permanent, None::<&NoDeleteProgress>);

    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.success_count(), 1);
    assert_eq!(result.bytes_freed, 4);
    assert!(!present.exists());
}
