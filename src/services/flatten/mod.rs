//! Directory flattening: copy every file of a subtree into one folder.
//!
//! Nested paths are discarded, the destination is overwritten on name
//! collisions and `dialog.tlk` is never copied (it belongs at the output root).

use crate::services::fs_utils::file_utils;
use crate::types::errors::FatalCopyError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The talk table file. Always lives at the install root, never in `Override`.
pub const DIALOG_TLK: &str = "dialog.tlk";

/// Order in which a flatten walk visits files. The last file visited wins a
/// base-name collision, so this decides the tie-break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalkOrder {
    /// Sorted by file name at every level. Reproducible across machines.
    #[default]
    Lexicographic,
    /// Whatever order the filesystem returns.
    Native,
}

#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions {
    pub order: WalkOrder,
    pub preserve_mtime: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            order: WalkOrder::Lexicographic,
            preserve_mtime: true,
        }
    }
}

/// What a single flatten call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenSummary {
    pub copied: usize,
    /// `dialog.tlk` files seen (and not copied), in walk order.
    pub skipped_tlk: Vec<PathBuf>,
}

pub fn is_dialog_tlk(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().eq_ignore_ascii_case(DIALOG_TLK))
        .unwrap_or(false)
}

/// Copy every regular file under `source` straight into `dest` by base name.
///
/// A missing `source` is a no-op. Any read or copy failure is returned as a
/// [`FatalCopyError`]; callers abort the run on it.
pub fn flatten(
    source: &Path,
    dest: &Path,
    options: FlattenOptions,
) -> Result<FlattenSummary, FatalCopyError> {
    let mut summary = FlattenSummary::default();

    if !source.is_dir() {
        log::debug!("Nothing to flatten at {}", source.display());
        return Ok(summary);
    }

    fs::create_dir_all(dest).map_err(|e| FatalCopyError {
        from: source.to_path_buf(),
        to: dest.to_path_buf(),
        source: e,
    })?;

    log::info!("Processing directory: {}", source.display());

    let mut walker = WalkDir::new(source);
    if options.order == WalkOrder::Lexicographic {
        walker = walker.sort_by_file_name();
    }

    for entry in walker {
        let entry = entry.map_err(|e| FatalCopyError {
            from: e.path().unwrap_or(source).to_path_buf(),
            to: dest.to_path_buf(),
            source: e.into(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let src_path = entry.path();
        if is_dialog_tlk(src_path) {
            summary.skipped_tlk.push(src_path.to_path_buf());
            continue;
        }

        let dest_path = dest.join(entry.file_name());
        log::debug!("Copying: {}", entry.file_name().to_string_lossy());
        file_utils::copy_file(src_path, &dest_path, options.preserve_mtime)?;
        summary.copied += 1;
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "tests/flatten_tests.rs"]
mod tests;
