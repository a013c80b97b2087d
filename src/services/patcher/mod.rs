//! Patch runner: find a patcher inside an extracted package and apply it to
//! the working base install.
//!
//! The external tool is a fixed convention of the modding scene: a
//! `tslpatchdata` folder sitting next to `TSLPatcher.exe`, invoked with the
//! game directory as its only argument.

mod locate;
mod process;

pub use locate::{find_executable, locate_patch_root};
pub use process::ProcessPatchTool;

use crate::services::core::cancel::CancelFlag;
use crate::types::errors::PatchError;
use std::path::{Path, PathBuf};

/// File the patcher's stdout/stderr are captured into, inside the package staging dir.
pub const PATCHER_LOG: &str = "patcher.log";

/// Everything a [`PatchTool`] needs to launch one patcher.
#[derive(Debug, Clone, Copy)]
pub struct PatchInvocation<'a> {
    pub package: &'a str,
    pub executable: &'a Path,
    pub patch_root: &'a Path,
    /// Absolute path of the working base install.
    pub target: &'a Path,
    pub log_path: &'a Path,
}

/// The capability "apply this patcher to that directory".
pub trait PatchTool {
    fn run(&self, invocation: &PatchInvocation<'_>, cancel: &CancelFlag) -> Result<(), PatchError>;
}

/// Names that identify a patcher inside a package.
#[derive(Debug, Clone)]
pub struct PatchLayout {
    pub data_dir: String,
    pub executable: String,
}

impl Default for PatchLayout {
    fn default() -> Self {
        Self {
            data_dir: "tslpatchdata".to_string(),
            executable: "TSLPatcher.exe".to_string(),
        }
    }
}

/// Where a successful patch came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPatch {
    pub patch_root: PathBuf,
    pub log_path: PathBuf,
}

/// Locate the patcher under `extracted_dir` and run it against `base_install`.
pub fn apply_patch(
    package: &str,
    extracted_dir: &Path,
    base_install: &Path,
    layout: &PatchLayout,
    tool: &dyn PatchTool,
    cancel: &CancelFlag,
) -> Result<AppliedPatch, PatchError> {
    let patch_root = locate_patch_root(extracted_dir, &layout.data_dir, &layout.executable)
        .ok_or_else(|| PatchError::MissingPatchData {
            package: package.to_string(),
            data_dir: layout.data_dir.clone(),
        })?;

    let executable = find_executable(&patch_root, &layout.executable).ok_or_else(|| {
        PatchError::MissingExecutable {
            package: package.to_string(),
            root: patch_root.clone(),
        }
    })?;

    let target = dunce::canonicalize(base_install).map_err(|source| PatchError::Io {
        package: package.to_string(),
        source,
    })?;

    let log_path = extracted_dir.join(PATCHER_LOG);

    tool.run(
        &PatchInvocation {
            package,
            executable: &executable,
            patch_root: &patch_root,
            target: &target,
            log_path: &log_path,
        },
        cancel,
    )?;

    log::info!("Patch applied: {package}");
    Ok(AppliedPatch {
        patch_root,
        log_path,
    })
}

#[cfg(test)]
#[path = "tests/patcher_tests.rs"]
mod tests;
