//! Lock for the directories an install run owns.
//!
//! A run resets the working base install and recreates the output tree, so
//! two runs must never share them. Each directory gets a `.<dir>.lock` file
//! beside it holding an exclusive `flock`. The OS drops the lock when the
//! process exits, so a killed run never leaves a stale lock behind.

use crate::types::errors::{InstallError, InstallResult};
use fs2::FileExt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct RunLock {
    /// Open handles keep the locks held.
    held: Vec<(PathBuf, File)>,
}

impl RunLock {
    /// Lock every directory in `dirs` without blocking. Fails with
    /// [`InstallError::Busy`] if another run holds any of them; locks taken
    /// so far are released.
    pub fn acquire<P: AsRef<Path>>(dirs: &[P]) -> InstallResult<Self> {
        let mut lock = Self { held: Vec::new() };

        for dir in dirs {
            let dir = dir.as_ref();
            let lock_path = lock_path_for(dir);
            if lock.held.iter().any(|(path, _)| *path == lock_path) {
                continue;
            }

            if let Some(parent) = lock_path.parent() {
                fs::create_dir_all(parent).map_err(|e| InstallError::workspace(parent, e))?;
            }

            let file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)
                .map_err(|e| InstallError::workspace(&lock_path, e))?;

            match file.try_lock_exclusive() {
                Ok(()) => {
                    log::debug!("Acquired run lock {}", lock_path.display());
                    lock.held.push((lock_path, file));
                }
                Err(e) if is_contended(&e) => {
                    log::warn!("Run lock {} is held by another run", lock_path.display());
                    return Err(InstallError::Busy {
                        path: dir.to_path_buf(),
                    });
                }
                Err(e) => return Err(InstallError::workspace(&lock_path, e)),
            }
        }

        Ok(lock)
    }

    pub fn lock_files(&self) -> Vec<&Path> {
        self.held.iter().map(|(path, _)| path.as_path()).collect()
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        for (path, file) in &self.held {
            if let Err(e) = FileExt::unlock(file) {
                log::warn!("Failed to release run lock {}: {e}", path.display());
            }
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// `<parent>/.<name>.lock` for a directory path.
pub fn lock_path_for(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "workspace".to_string());
    let parent = dir.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!(".{name}.lock"))
}

#[cfg(test)]
#[path = "tests/run_lock_tests.rs"]
mod tests;
