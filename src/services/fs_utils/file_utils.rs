use crate::types::errors::FatalCopyError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Delete `path` (if present) and recreate it empty.
pub fn reset_dir(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)
}

/// Remove a directory tree, treating "already gone" as success.
/// Returns whether anything was deleted.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Copy one file verbatim, overwriting `to`. Optionally carries over the
/// source modification time.
pub fn copy_file(from: &Path, to: &Path, preserve_mtime: bool) -> Result<u64, FatalCopyError> {
    let wrap = |source: io::Error| FatalCopyError {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let bytes = fs::copy(from, to).map_err(wrap)?;

    if preserve_mtime {
        let meta = fs::metadata(from).map_err(wrap)?;
        let mtime = filetime::FileTime::from_last_modification_time(&meta);
        filetime::set_file_mtime(to, mtime).map_err(wrap)?;
    }

    Ok(bytes)
}

/// Move the contents of `from` into `to`, overwriting files that already exist.
///
/// Uses a plain rename when `to` does not exist yet. Otherwise (or when the
/// rename fails, e.g. cross-device) it falls back to `fs_extra`'s
/// copy-and-remove merge. `from` is gone afterwards.
pub fn merge_move_dir(from: &Path, to: &Path) -> io::Result<()> {
    if !from.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            "Source directory does not exist",
        ));
    }

    if !to.exists() {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        match fs::rename(from, to) {
            Ok(()) => return Ok(()),
            Err(e) => log::warn!(
                "fs::rename failed (cross-device?): {}. Attempting fallback move...",
                e
            ),
        }
    }

    fs::create_dir_all(to)?;

    let mut options = fs_extra::dir::CopyOptions::new();
    options.overwrite = true;
    options.content_only = true;
    options.copy_inside = true;

    fs_extra::dir::move_dir(from, to, &options)
        .map(|_| ())
        .map_err(|err| io::Error::other(err.to_string()))
}

/// Copy everything inside `from` into `to`, creating `to` if needed.
pub fn copy_dir_contents(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    if !from.is_dir() {
        return Ok(());
    }

    let mut options = fs_extra::dir::CopyOptions::new();
    options.overwrite = true;
    options.content_only = true;

    fs_extra::dir::copy(from, to, &options)
        .map(|_| ())
        .map_err(|err| io::Error::other(err.to_string()))
}

/// Find a direct child of `dir` by name, ignoring ASCII case.
///
/// An exact-case match wins; otherwise the lexicographically first
/// case-insensitive match is returned so the choice is stable.
pub fn find_child_ci(dir: &Path, name: &str, want_dir: bool) -> Option<PathBuf> {
    let exact = dir.join(name);
    if (want_dir && exact.is_dir()) || (!want_dir && exact.is_file()) {
        return Some(exact);
    }

    let entries = fs::read_dir(dir).ok()?;
    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|e| e.path())
        .filter(|p| if want_dir { p.is_dir() } else { p.is_file() })
        .collect();

    matches.sort();
    matches.into_iter().next()
}

/// List the direct children of `dir` sorted by file name.
pub fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        match entry {
            Ok(e) => entries.push(e.path()),
            Err(e) => log::warn!("Skipping unreadable entry in {}: {e}", dir.display()),
        }
    }
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}
