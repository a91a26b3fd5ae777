use prunedupe::duplicates::DuplicateFinder;
use prunedupe::scanner::ScanError;
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_hardlinks_grouped_as_duplicates() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    let hardlink = dir.path().join("hardlink.txt");

    File::create(&original)
        .unwrap()
        .write_all(b"identical content")
        .unwrap();

    if let Err(e) = fs::hard_link(&original, &hardlink) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    // Two names, two records: removing one name is how the copy is pruned.
    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn test_symlink_to_file_in_tree_indexed_once() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("original.txt");
        File::create(&original).unwrap().write_all(b"content").unwrap();
        symlink(&original, dir.path().join("link.txt")).unwrap();

        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

        assert_eq!(summary.total_files, 1);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_symlink_resolves_to_target_outside_root() {
        let outside = tempdir().unwrap();
        let root = tempdir().unwrap();
        let target = outside.path().join("data.txt");
        File::create(&target).unwrap().write_all(b"shared").unwrap();
        File::create(root.path().join("copy.txt"))
            .unwrap()
            .write_all(b"shared")
            .unwrap();
        symlink(&target, root.path().join("link.txt")).unwrap();

        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder.find_duplicates(root.path()).unwrap();

        assert_eq!(summary.total_files, 2);
        assert_eq!(groups.len(), 1);
        let paths = groups[0].paths();
        assert!(paths.contains(&target.canonicalize().unwrap()));
        assert!(!paths.iter().any(|p| p.ends_with("link.txt")));
    }

    #[test]
    fn test_dangling_symlink_recorded_and_skipped() {
        let dir = tempdir().unwrap();
        symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();
        File::create(dir.path().join("a.txt")).unwrap().write_all(b"x").unwrap();
        File::create(dir.path().join("b.txt")).unwrap().write_all(b"x").unwrap();

        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(summary.failed_files, 1);
        assert!(matches!(
            summary.scan_errors.as_slice(),
            [ScanError::Unresolvable { .. }]
        ));
    }

    #[test]
    fn test_symlink_cycle_does_not_hang() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        symlink(&sub, sub.join("link")).unwrap();
        File::create(sub.join("file.txt")).unwrap().write_all(b"data").unwrap();

        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

        assert!(groups.is_empty());
        assert_eq!(summary.total_files, 1);
    }
}
