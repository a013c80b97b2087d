use super::file_utils::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_reset_dir_removes_stale_content() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("dummy_kotor");
    fs::create_dir_all(target.join("Override")).unwrap();
    fs::write(target.join("Override").join("stale.2da"), b"old").unwrap();

    reset_dir(&target).unwrap();

    assert!(target.is_dir());
    assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
}

#[test]
fn test_remove_dir_if_exists_reports_missing() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("never_created");

    assert!(!remove_dir_if_exists(&target).unwrap());

    fs::create_dir(&target).unwrap();
    assert!(remove_dir_if_exists(&target).unwrap());
    assert!(!target.exists());
}

#[test]
fn test_copy_file_overwrites_and_keeps_mtime() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src.tga");
    let dst = dir.path().join("dst.tga");
    fs::write(&src, b"new texture").unwrap();
    fs::write(&dst, b"old").unwrap();

    let mtime = filetime::FileTime::from_unix_time(1_000_000_000, 0);
    filetime::set_file_mtime(&src, mtime).unwrap();

    let bytes = copy_file(&src, &dst, true).unwrap();

    assert_eq!(bytes, 11);
    assert_eq!(fs::read(&dst).unwrap(), b"new texture");
    let copied = filetime::FileTime::from_last_modification_time(&fs::metadata(&dst).unwrap());
    assert_eq!(copied, mtime);
}

#[test]
fn test_copy_file_missing_source_is_fatal_copy_error() {
    let dir = TempDir::new().unwrap();
    let err = copy_file(
        &dir.path().join("missing.txt"),
        &dir.path().join("out.txt"),
        false,
    )
    .unwrap_err();

    assert!(err.from.ends_with("missing.txt"));
    assert!(err.to_string().starts_with("Failed to copy"));
}

#[test]
fn test_merge_move_dir_into_new_destination() {
    let dir = TempDir::new().unwrap();
    let from = dir.path().join("tmp");
    fs::create_dir_all(from.join("Override")).unwrap();
    fs::write(from.join("Override").join("a.txt"), b"A").unwrap();

    let to = dir.path().join("staging").join("ModA");
    merge_move_dir(&from, &to).unwrap();

    assert!(!from.exists());
    assert_eq!(fs::read(to.join("Override").join("a.txt")).unwrap(), b"A");
}

#[test]
fn test_merge_move_dir_overwrites_existing_files() {
    let dir = TempDir::new().unwrap();
    let to = dir.path().join("staging");
    fs::create_dir_all(to.join("Override")).unwrap();
    fs::write(to.join("Override").join("a.txt"), b"old").unwrap();
    fs::write(to.join("keep.txt"), b"keep").unwrap();

    let from = dir.path().join("tmp");
    fs::create_dir_all(from.join("Override")).unwrap();
    fs::write(from.join("Override").join("a.txt"), b"new").unwrap();

    merge_move_dir(&from, &to).unwrap();

    assert_eq!(fs::read(to.join("Override").join("a.txt")).unwrap(), b"new");
    assert_eq!(fs::read(to.join("keep.txt")).unwrap(), b"keep");
    assert!(!from.exists());
}

#[test]
fn test_find_child_ci_prefers_exact_then_case_insensitive() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("override")).unwrap();
    fs::write(dir.path().join("Dialog.TLK"), b"tlk").unwrap();

    let found_dir = find_child_ci(dir.path(), "Override", true).unwrap();
    assert!(found_dir.ends_with("override"));

    let found_file = find_child_ci(dir.path(), "dialog.tlk", false).unwrap();
    assert!(found_file.ends_with("Dialog.TLK"));

    // Kind must match
    assert!(find_child_ci(dir.path(), "dialog.tlk", true).is_none());
    assert!(find_child_ci(dir.path(), "Modules", true).is_none());
}

#[test]
fn test_sorted_entries_is_name_ordered() {
    let dir = TempDir::new().unwrap();
    for name in ["c.txt", "a.txt", "b"] {
        let p = dir.path().join(name);
        if name.contains('.') {
            fs::write(p, b"").unwrap();
        } else {
            fs::create_dir(p).unwrap();
        }
    }

    let names: Vec<String> = sorted_entries(dir.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.txt", "b", "c.txt"]);
}

#[test]
fn test_copy_dir_contents_keeps_layout() {
    let dir = TempDir::new().unwrap();
    let from = dir.path().join("base");
    fs::create_dir_all(from.join("Override")).unwrap();
    fs::write(from.join("Override").join("a.2da"), b"a").unwrap();
    fs::write(from.join("dialog.tlk"), b"T").unwrap();

    let to = dir.path().join("snapshot");
    copy_dir_contents(&from, &to).unwrap();

    assert_eq!(fs::read(to.join("Override").join("a.2da")).unwrap(), b"a");
    assert_eq!(fs::read(to.join("dialog.tlk")).unwrap(), b"T");
    assert!(from.join("dialog.tlk").is_file());
}
