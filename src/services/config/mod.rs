//! Installer settings persisted as a JSON file.

pub mod models;

pub use models::*;

use crate::types::errors::ConfigError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Read settings from `path`. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<InstallerSettings, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(InstallerSettings::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let settings: InstallerSettings =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    settings.validate()?;
    Ok(settings)
}

/// Write settings atomically: a temp file in the same folder is persisted over `path`.
pub fn save_settings(path: &Path, settings: &InstallerSettings) -> Result<(), ConfigError> {
    settings.validate()?;

    let write_err = |source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| write_err(std::io::Error::other(e)))?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

/// Settings file plus its in-memory copy.
pub struct ConfigService {
    path: PathBuf,
    settings: Mutex<InstallerSettings>,
}

impl ConfigService {
    pub fn open(path: PathBuf) -> Result<Self, ConfigError> {
        let settings = load_settings(&path)?;
        Ok(Self {
            path,
            settings: Mutex::new(settings),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_settings(&self) -> InstallerSettings {
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn save_settings(&self, new_settings: InstallerSettings) -> Result<(), ConfigError> {
        save_settings(&self.path, &new_settings)?;
        *self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = new_settings;
        Ok(())
    }
}
