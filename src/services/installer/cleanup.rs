use super::types::Workspace;
use crate::services::core::run_lock::RunLock;
use crate::services::fs_utils::file_utils;
use crate::types::errors::{InstallError, InstallResult};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSummary {
    pub removed: Vec<PathBuf>,
    /// Folders that were already absent.
    pub missing: Vec<PathBuf>,
}

/// Delete the working base install and both staging roots. With
/// `remove_output`, the package folder handed to the user goes too.
pub fn cleanup(ws: &Workspace, remove_output: bool) -> InstallResult<CleanupSummary> {
    let _lock = RunLock::acquire(&[&ws.base_install, &ws.package_root])?;

    let mut targets = vec![&ws.base_install, &ws.loose_staging, &ws.patch_staging];
    if remove_output {
        targets.push(&ws.package_root);
    }

    let mut summary = CleanupSummary::default();
    for dir in targets {
        match file_utils::remove_dir_if_exists(dir) {
            Ok(true) => {
                log::info!("Removed {}", dir.display());
                summary.removed.push(dir.clone());
            }
            Ok(false) => summary.missing.push(dir.clone()),
            Err(e) => return Err(InstallError::workspace(dir, e)),
        }
    }
    Ok(summary)
}
