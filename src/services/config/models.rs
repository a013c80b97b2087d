use crate::services::flatten::{FlattenOptions, WalkOrder};
use crate::services::patcher::{PatchLayout, ProcessPatchTool};
use crate::types::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct InstallerSettings {
    /// Disposable copy of the game install the patchers run against.
    pub base_install_dir: String,
    /// Where loose-file packages are extracted.
    pub loose_staging_dir: String,
    /// Where patcher packages are extracted, one folder each.
    pub patch_staging_dir: String,
    /// Top-level folder handed to the user.
    pub package_dir: String,
    /// Output tree inside `package_dir` (the game's data folder on device).
    pub output_subpath: String,
    pub patch_data_dir: String,
    pub patcher_exe: String,
    /// Optional program that runs the patcher, e.g. `wine`.
    pub patcher_launcher: Option<PathBuf>,
    /// `None` waits for the patcher indefinitely.
    pub patch_timeout_secs: Option<u64>,
    pub walk_order: WalkOrder,
    pub preserve_mtime: bool,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            base_install_dir: "dummy_kotor".into(),
            loose_staging_dir: "final_override".into(),
            patch_staging_dir: "patcher_mods".into(),
            package_dir: "final_package".into(),
            output_subpath: "Android/data/com.aspyr.swkotor/files".into(),
            patch_data_dir: "tslpatchdata".into(),
            patcher_exe: "TSLPatcher.exe".into(),
            patcher_launcher: None,
            patch_timeout_secs: Some(600),
            walk_order: WalkOrder::Lexicographic,
            preserve_mtime: true,
        }
    }
}

impl InstallerSettings {
    /// Reject values that would make the workspace layout ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dirs = [
            ("base_install_dir", &self.base_install_dir),
            ("loose_staging_dir", &self.loose_staging_dir),
            ("patch_staging_dir", &self.patch_staging_dir),
            ("package_dir", &self.package_dir),
        ];

        for (key, value) in dirs {
            if value.trim().is_empty() {
                return Err(invalid(key, "must not be empty"));
            }
            if value.contains('/') || value.contains('\\') || value == ".." || value == "." {
                return Err(invalid(key, "must be a single folder name"));
            }
        }

        for (i, (key, value)) in dirs.iter().enumerate() {
            if dirs[..i].iter().any(|(_, other)| other == value) {
                return Err(invalid(key, "must differ from the other workspace folders"));
            }
        }

        if self.patch_data_dir.trim().is_empty() {
            return Err(invalid("patch_data_dir", "must not be empty"));
        }
        if self.patcher_exe.trim().is_empty() {
            return Err(invalid("patcher_exe", "must not be empty"));
        }
        if self.patch_timeout_secs == Some(0) {
            return Err(invalid(
                "patch_timeout_secs",
                "must be positive (use null to wait indefinitely)",
            ));
        }

        Ok(())
    }

    pub fn patch_timeout(&self) -> Option<Duration> {
        self.patch_timeout_secs.map(Duration::from_secs)
    }

    pub fn patch_layout(&self) -> PatchLayout {
        PatchLayout {
            data_dir: self.patch_data_dir.clone(),
            executable: self.patcher_exe.clone(),
        }
    }

    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            order: self.walk_order,
            preserve_mtime: self.preserve_mtime,
        }
    }

    pub fn patch_tool(&self) -> ProcessPatchTool {
        ProcessPatchTool::new(self.patcher_launcher.clone(), self.patch_timeout())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}
