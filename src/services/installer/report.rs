use super::manifest::ManifestEntry;
use super::types::{Package, PackageKind};
use crate::types::errors::{ExtractError, PatchError};
use serde::Serialize;
use std::path::PathBuf;

// ─── Event Types ───────────────────────────────────────────────────

/// Progress events handed to the caller's callback during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "event", content = "data")]
pub enum InstallEvent {
    #[serde(rename_all = "camelCase")]
    Started { run_id: String, total_steps: usize },
    #[serde(rename_all = "camelCase")]
    PackageStarted {
        step: usize,
        total_steps: usize,
        name: String,
        kind: PackageKind,
    },
    #[serde(rename_all = "camelCase")]
    PackageFinished {
        step: usize,
        total_steps: usize,
        name: String,
        kind: PackageKind,
        error: Option<String>,
    },
    /// Output tree is being rebuilt from the base install and loose packages.
    #[serde(rename_all = "camelCase")]
    Combining { step: usize, total_steps: usize },
    #[serde(rename_all = "camelCase")]
    Finished {
        installed: usize,
        failed: usize,
        output_dir: PathBuf,
    },
}

// ─── Result Types ──────────────────────────────────────────────────

/// Why a package contributed nothing to the output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "stage", content = "message")]
pub enum PackageFailure {
    Extract(ExtractError),
    Patch(PatchError),
}

impl std::fmt::Display for PackageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extract(e) => write!(f, "{e}"),
            Self::Patch(e) => write!(f, "{e}"),
        }
    }
}

/// What happened to one package.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageOutcome {
    pub name: String,
    pub archive: PathBuf,
    pub kind: PackageKind,
    pub files_extracted: Option<usize>,
    pub staging_dir: Option<PathBuf>,
    pub patch_log: Option<PathBuf>,
    pub failure: Option<PackageFailure>,
}

impl PackageOutcome {
    pub fn new(package: &Package) -> Self {
        Self {
            name: package.name(),
            archive: package.path.clone(),
            kind: package.kind,
            files_extracted: None,
            staging_dir: None,
            patch_log: None,
            failure: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Result of a full install run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallReport {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub output_dir: PathBuf,
    pub packages: Vec<PackageOutcome>,
    pub manifest: Vec<ManifestEntry>,
}

impl InstallReport {
    pub fn failed(&self) -> impl Iterator<Item = &PackageOutcome> {
        self.packages.iter().filter(|p| !p.succeeded())
    }

    pub fn installed_count(&self) -> usize {
        self.packages.iter().filter(|p| p.succeeded()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn outcome(&self, name: &str) -> Option<&PackageOutcome> {
        self.packages.iter().find(|p| p.name == name)
    }
}
