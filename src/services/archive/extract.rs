use super::types::ArchiveFormat;
use crate::types::errors::ExtractError;
use std::fs;
use std::io;
use std::path::Path;

/// Extract a supported archive into `dest_dir`, creating it if needed.
///
/// The format is picked from the extension (case-insensitive). Returns the
/// number of regular files written.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError> {
    let archive = archive_display_name(archive_path);

    let format = ArchiveFormat::from_path(archive_path).ok_or_else(|| {
        ExtractError::Unsupported {
            archive: archive.clone(),
        }
    })?;

    if !archive_path.is_file() {
        return Err(ExtractError::Io {
            archive,
            source: io::Error::new(io::ErrorKind::NotFound, "archive file not found"),
        });
    }

    fs::create_dir_all(dest_dir).map_err(|source| ExtractError::Io {
        archive: archive.clone(),
        source,
    })?;

    let count = match format {
        ArchiveFormat::Zip => extract_zip_inner(archive_path, dest_dir, &archive)?,
        ArchiveFormat::SevenZ => extract_7z_inner(archive_path, dest_dir, &archive)?,
        ArchiveFormat::Rar => extract_rar_inner(archive_path, dest_dir, &archive)?,
    };

    log::debug!("Extracted {count} files from {archive}");
    Ok(count)
}

fn archive_display_name(archive_path: &Path) -> String {
    archive_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| archive_path.display().to_string())
}

/// Map a decoder message to the password / corrupt split.
fn decoder_error(archive: &str, message: String) -> ExtractError {
    let lower = message.to_lowercase();
    if lower.contains("password") || lower.contains("decrypt") {
        ExtractError::PasswordProtected {
            archive: archive.to_string(),
        }
    } else {
        ExtractError::Corrupt {
            archive: archive.to_string(),
            message,
        }
    }
}

fn extract_zip_inner(
    archive_path: &Path,
    dest_dir: &Path,
    archive: &str,
) -> Result<usize, ExtractError> {
    let io_err = |source: io::Error| ExtractError::Io {
        archive: archive.to_string(),
        source,
    };

    let file = fs::File::open(archive_path).map_err(io_err)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| decoder_error(archive, e.to_string()))?;

    let mut count: usize = 0;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| decoder_error(archive, format!("entry {i}: {e}")))?;

        let entry_path = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                log::warn!("Skipping unsafe entry '{}' in {archive}", entry.name());
                continue;
            }
        };

        let output_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&output_path).map_err(io_err)?;
        } else {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
            let mut outfile = fs::File::create(&output_path).map_err(io_err)?;
            io::copy(&mut entry, &mut outfile)
                .map_err(|e| decoder_error(archive, format!("entry {i}: {e}")))?;
            count += 1;
        }
    }
    Ok(count)
}

fn extract_7z_inner(
    archive_path: &Path,
    dest_dir: &Path,
    archive: &str,
) -> Result<usize, ExtractError> {
    sevenz_rust::decompress_file(archive_path, dest_dir)
        .map_err(|e| decoder_error(archive, e.to_string()))?;

    Ok(count_files(dest_dir))
}

fn extract_rar_inner(
    archive_path: &Path,
    dest_dir: &Path,
    archive: &str,
) -> Result<usize, ExtractError> {
    let invalid_utf8 = || ExtractError::Io {
        archive: archive.to_string(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path contains invalid UTF-8"),
    };
    let path_str = archive_path.to_str().ok_or_else(invalid_utf8)?;
    let dest_str = dest_dir.to_str().ok_or_else(invalid_utf8)?;

    rar::Archive::extract_all(path_str, dest_str, "")
        .map_err(|e| decoder_error(archive, format!("{e:?}")))?;

    Ok(count_files(dest_dir))
}

fn count_files(dir: &Path) -> usize {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}
