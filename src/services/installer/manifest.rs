use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// One file of the output tree. Equal manifests mean byte-identical trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path relative to the output root, `/`-separated.
    pub path: String,
    pub size: u64,
    pub blake3: String,
}

/// Hash every regular file under `root`, sorted by relative path.
pub fn build_manifest(root: &Path) -> io::Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(io::Error::other)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let mut hasher = blake3::Hasher::new();
        let mut file = fs::File::open(entry.path())?;
        let size = io::copy(&mut file, &mut hasher)?;

        entries.push(ManifestEntry {
            path: relative,
            size,
            blake3: hasher.finalize().to_hex().to_string(),
        });
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}
