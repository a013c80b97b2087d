use std::path::{Component, Path, PathBuf};

/// Whether a relative path stays inside whatever directory it is joined to.
/// Absolute paths, drive prefixes and `..` that climbs above the start are rejected.
pub fn is_contained(relative: &Path) -> bool {
    let mut depth: usize = 0;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Join `relative` onto `base`, refusing anything that escapes `base`.
pub fn join_contained(base: &Path, relative: &str) -> std::io::Result<PathBuf> {
    let target = Path::new(relative);
    if !is_contained(target) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("Path '{relative}' escapes {}", base.display()),
        ));
    }
    Ok(base.join(target))
}

/// Absolute, symlink-resolved form of `path`, which need not exist yet.
///
/// `.` and `..` are folded lexically, the deepest existing ancestor is
/// canonicalized and the missing tail is re-appended.
pub fn resolve_path(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut folded = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                folded.pop();
            }
            Component::CurDir => {}
            other => folded.push(other),
        }
    }

    let mut existing = folded.as_path();
    let mut tail = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(folded),
        }
    }

    let mut resolved = dunce::canonicalize(existing)?;
    resolved.extend(tail.iter().rev());
    Ok(resolved)
}

/// Display name for a package: the archive file name without its extension.
pub fn package_name(archive_path: &Path) -> String {
    archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "package".to_string())
}

/// Pick a staging directory under `parent` for `name`.
///
/// The name is sanitized for the filesystem; when the directory is already
/// taken (two archives with the same stem) a ` (n)` suffix is appended.
pub fn unique_staging_dir(parent: &Path, name: &str) -> PathBuf {
    let base = sanitize_filename::sanitize(name);
    let base = if base.is_empty() {
        "package".to_string()
    } else {
        base
    };

    let mut candidate = parent.join(&base);
    let mut counter = 1;
    while candidate.exists() {
        candidate = parent.join(format!("{base} ({counter})"));
        counter += 1;
    }
    candidate
}
