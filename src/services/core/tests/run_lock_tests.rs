use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_lock_acquisition() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("dummy_kotor");

    let lock = RunLock::acquire(&[&base]);
    assert!(lock.is_ok(), "First acquisition should succeed");
    assert!(dir.path().join(".dummy_kotor.lock").exists());
}

#[test]
fn test_lock_contention() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("dummy_kotor");
    let output = dir.path().join("final_package");

    let _guard = RunLock::acquire(&[&base, &output]).unwrap();

    // Sharing only the output directory is enough to be refused
    let other_base = dir.path().join("other_base");
    let result = RunLock::acquire(&[&other_base, &output]);
    match result {
        Err(InstallError::Busy { path }) => assert_eq!(path, output),
        other => panic!("Expected InstallError::Busy, got {other:?}"),
    }

    // The partial lock on other_base was released again
    assert!(RunLock::acquire(&[&other_base]).is_ok());
}

#[test]
fn test_lock_release_on_drop() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("dummy_kotor");
    {
        let _guard = RunLock::acquire(&[&base]).unwrap();
        // Guard dropped here
    }

    let result = RunLock::acquire(&[&base]);
    assert!(result.is_ok(), "Should succeed after guard is dropped");
}

#[test]
fn test_duplicate_dirs_locked_once() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("same");

    let lock = RunLock::acquire(&[&base, &base]).unwrap();
    assert_eq!(lock.lock_files().len(), 1);
}

#[test]
fn test_leftover_lock_file_does_not_block() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("dummy_kotor");

    // A run that was killed leaves its lock file behind but holds no lock.
    fs::write(dir.path().join(".dummy_kotor.lock"), b"4242\n").unwrap();

    assert!(RunLock::acquire(&[&base]).is_ok());
}

#[test]
fn test_leaked_guard_releases_when_handle_closes() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("dummy_kotor");

    let mut lock = RunLock::acquire(&[&base]).unwrap();
    assert!(matches!(
        RunLock::acquire(&[&base]),
        Err(InstallError::Busy { .. })
    ));

    // Close the handles without running Drop, as a crashed process would.
    let handles = std::mem::take(&mut lock.held);
    std::mem::forget(lock);
    drop(handles);

    assert!(RunLock::acquire(&[&base]).is_ok());
}

#[test]
fn test_cancel_flag_shared_between_clones() {
    use crate::services::core::cancel::CancelFlag;

    let flag = CancelFlag::new();
    let observer = flag.clone();
    assert!(!observer.is_cancelled());

    flag.cancel();
    assert!(observer.is_cancelled());

    observer.reset();
    assert!(!flag.is_cancelled());
}
