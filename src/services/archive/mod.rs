//! Archive extraction facade over the zip / 7z / rar decoders.
//!
//! Extraction keeps the archive's internal layout; flattening happens later.

mod extract;
mod types;

pub use extract::extract_archive;
pub use types::{supports_archive, ArchiveFormat};

use crate::types::errors::ExtractError;
use std::path::Path;

/// Something that can unpack a package archive into a directory.
pub trait Extractor {
    /// Extract `archive_path` under `dest_dir`, returning the number of files written.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError>;
}

/// Default extractor dispatching on file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveExtractor;

impl Extractor for ArchiveExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError> {
        extract_archive(archive_path, dest_dir)
    }
}

#[cfg(test)]
#[path = "tests/extract_tests.rs"]
mod tests;
