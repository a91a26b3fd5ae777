use prunedupe::actions::delete::NoDeleteProgress;
use prunedupe::actions::prune::{prune_duplicates, PruneOptions};
use prunedupe::actions::retention::RootDesignation;
use prunedupe::duplicates::DuplicateFinder;
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_paths_with_quotes_and_newlines() {
    // Windows does not allow these characters in filenames.
    if cfg!(windows) {
        return;
    }
    let dir = tempdir().unwrap();
    for name in ["file_with_\"quote\".txt", "file_with\nnewline.txt", "plain.txt"] {
        File::create(dir.path().join(name))
            .unwrap()
            .write_all(b"content")
            .unwrap();
    }

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 3);
    assert!(groups[0]
        .files
        .iter()
        .any(|f| f.path.to_string_lossy().contains('\n')));
}

#[test]
fn test_extremely_long_paths() {
    let dir = tempdir().unwrap();

    let mut current_path = dir.path().to_path_buf();
    let folder_name = "a".repeat(50);
    for i in 0..6 {
        current_path = current_path.join(format!("{}_{}", i, folder_name));
        if let Err(e) = fs::create_dir(&current_path) {
            eprintln!("Skipping long path test: failed to create dir: {}", e);
            return;
        }
    }

    let file_path = current_path.join("file.txt");
    if let Err(e) = File::create(&file_path).and_then(|mut f| f.write_all(b"content")) {
        eprintln!("Skipping long path test: failed to create file: {}", e);
        return;
    }
    File::create(dir.path().join("duplicate.txt"))
        .unwrap()
        .write_all(b"content")
        .unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
}

#[test]
fn test_sibling_with_shared_name_prefix_is_not_under_root() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let back = base.join("back");
    let backup = base.join("backup");
    let orig = base.join("orig");
    fs::create_dir_all(&back).unwrap();
    fs::create_dir_all(&backup).unwrap();
    fs::create_dir_all(&orig).unwrap();
    File::create(back.join("one.txt")).unwrap().write_all(b"twin").unwrap();
    File::create(backup.join("two.txt")).unwrap().write_all(b"twin").unwrap();
    File::create(orig.join("zero.txt")).unwrap().write_all(b"twin").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(&base).unwrap();
    assert_eq!(groups.len(), 1);

    // Only `back/` is removable; `backup/two.txt` must not count as inside it.
    let designation = RootDesignation::new(Some(orig.clone()), back.clone());
    let report = prune_duplicates(
        &groups,
        &designation,
        &PruneOptions::default(),
        None::<&NoDeleteProgress>,
    )
    .unwrap();

    assert_eq!(report.groups[0].decision.delete, vec![back.join("one.txt")]);
    assert!(!back.join("one.txt").exists());
    assert!(backup.join("two.txt").exists());
    assert!(orig.join("zero.txt").exists());
}
