use crate::services::config::InstallerSettings;
use crate::services::fs_utils::path_utils;
use crate::types::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const OVERRIDE_DIR: &str = "Override";
pub const MODULES_DIR: &str = "Modules";

// ─── Packages ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Files are copied straight into the output.
    Loose,
    /// Contains a patcher that is run against the working base install.
    Patched,
}

/// One archive in a load order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub path: PathBuf,
    pub kind: PackageKind,
}

impl Package {
    pub fn new(path: impl Into<PathBuf>, kind: PackageKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn loose(path: impl Into<PathBuf>) -> Self {
        Self::new(path, PackageKind::Loose)
    }

    pub fn patched(path: impl Into<PathBuf>) -> Self {
        Self::new(path, PackageKind::Patched)
    }

    /// Archive base name, used for staging folders and in reports.
    pub fn name(&self) -> String {
        path_utils::package_name(&self.path)
    }
}

/// Ordered list of packages of one kind. Later entries win collisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOrder {
    kind: PackageKind,
    packages: Vec<Package>,
}

impl LoadOrder {
    pub fn new(kind: PackageKind) -> Self {
        Self {
            kind,
            packages: Vec::new(),
        }
    }

    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.packages.push(Package::new(path, self.kind));
    }

    pub fn extend<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.push(path);
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Package> {
        (index < self.packages.len()).then(|| self.packages.remove(index))
    }

    pub fn clear(&mut self) {
        self.packages.clear();
    }

    /// Move the package at `index` one slot earlier. No-op at the top.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.packages.len() {
            return false;
        }
        self.packages.swap(index - 1, index);
        true
    }

    /// Move the package at `index` one slot later. No-op at the bottom.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.packages.len() {
            return false;
        }
        self.packages.swap(index, index + 1);
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Package> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl<'a> IntoIterator for &'a LoadOrder {
    type Item = &'a Package;
    type IntoIter = std::slice::Iter<'a, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}

// ─── Workspace ─────────────────────────────────────────────────────

/// Directories owned by one install run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Working copy of the game install; patchers write here.
    pub base_install: PathBuf,
    /// Loose packages are extracted here, one folder per package.
    pub loose_staging: PathBuf,
    /// Patcher packages are extracted here, one folder per package.
    pub patch_staging: PathBuf,
    /// Folder handed to the user; contains `output` (possibly nested).
    pub package_root: PathBuf,
    /// Final merged tree: `Override/`, `Modules/`, optional `dialog.tlk`.
    pub output: PathBuf,
}

impl Workspace {
    /// Explicit directories. The output folder is its own package root.
    pub fn new(
        base_install: impl Into<PathBuf>,
        loose_staging: impl Into<PathBuf>,
        patch_staging: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        let output = output.into();
        Self {
            base_install: base_install.into(),
            loose_staging: loose_staging.into(),
            patch_staging: patch_staging.into(),
            package_root: output.clone(),
            output,
        }
    }

    /// Lay the workspace out under `root` using the folder names from `settings`.
    pub fn from_settings(root: &Path, settings: &InstallerSettings) -> Result<Self, ConfigError> {
        settings.validate()?;

        let package_root = root.join(&settings.package_dir);
        let output = path_utils::join_contained(&package_root, &settings.output_subpath)
            .map_err(|e| ConfigError::Invalid {
                key: "output_subpath".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            base_install: root.join(&settings.base_install_dir),
            loose_staging: root.join(&settings.loose_staging_dir),
            patch_staging: root.join(&settings.patch_staging_dir),
            package_root,
            output,
        })
    }

    /// Same layout with the final output redirected to `output`.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self.package_root = self.output.clone();
        self
    }

    /// Create every workspace folder (and the base install skeleton) if missing.
    pub fn prepare(&self) -> io::Result<()> {
        for dir in [
            self.base_install.join(OVERRIDE_DIR),
            self.base_install.join(MODULES_DIR),
            self.loose_staging.clone(),
            self.patch_staging.clone(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

// ─── Request ───────────────────────────────────────────────────────

/// Everything one install run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub loose: LoadOrder,
    pub patched: LoadOrder,
    pub workspace: Workspace,
}

impl RunRequest {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            loose: LoadOrder::new(PackageKind::Loose),
            patched: LoadOrder::new(PackageKind::Patched),
            workspace,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.loose.len() + self.patched.len() + 1
    }
}
