use crate::services::fs_utils::file_utils;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find the patch package root: the parent of a directory named exactly
/// `data_dir` somewhere under `extracted`.
///
/// When a package ships several (option folders), the shallowest one whose
/// parent also holds `executable` wins, ties going to the first in name
/// order. Without any such root the shallowest data folder's parent is
/// returned so the caller can report the missing executable.
pub fn locate_patch_root(extracted: &Path, data_dir: &str, executable: &str) -> Option<PathBuf> {
    let mut found: Vec<(usize, PathBuf)> = WalkDir::new(extracted)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.file_name().to_string_lossy() == data_dir)
        .filter_map(|e| Some((e.depth(), e.path().parent()?.to_path_buf())))
        .collect();

    // Stable sort keeps walk order among equal depths
    found.sort_by_key(|(depth, _)| *depth);
    let roots: Vec<PathBuf> = found.into_iter().map(|(_, root)| root).collect();

    let chosen = roots
        .iter()
        .find(|root| find_executable(root, executable).is_some())
        .or_else(|| roots.first())?
        .clone();

    for ignored in roots.iter().filter(|root| **root != chosen) {
        log::warn!(
            "Ignoring additional patch data in {} (using {})",
            ignored.display(),
            chosen.display()
        );
    }
    Some(chosen)
}

/// The patcher executable inside a patch root, matched case-insensitively.
pub fn find_executable(patch_root: &Path, executable: &str) -> Option<PathBuf> {
    file_utils::find_child_ci(patch_root, executable, false)
}
