use super::manifest::build_manifest;
use super::report::{InstallEvent, InstallReport, PackageFailure, PackageOutcome};
use super::types::{Package, RunRequest, Workspace, MODULES_DIR, OVERRIDE_DIR};
use crate::services::archive::{ArchiveExtractor, Extractor};
use crate::services::config::InstallerSettings;
use crate::services::core::cancel::CancelFlag;
use crate::services::core::run_lock::RunLock;
use crate::services::flatten::{self, FlattenOptions, DIALOG_TLK};
use crate::services::fs_utils::{file_utils, path_utils};
use crate::services::patcher::{self, PatchLayout, PatchTool, PATCHER_LOG};
use crate::types::errors::{ExtractError, InstallError, InstallResult, PatchError};
use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

/// A package extracted into its staging folder.
struct Staged {
    dir: PathBuf,
    files: usize,
}

/// Runs the merge pipeline: extract loose packages, apply patchers to the
/// working base install, then rebuild the output tree with loose files on top.
pub struct Installer {
    layout: PatchLayout,
    flatten: FlattenOptions,
    extractor: Box<dyn Extractor>,
    patch_tool: Box<dyn PatchTool>,
    cancel: CancelFlag,
}

impl Installer {
    pub fn new(settings: &InstallerSettings) -> Self {
        Self {
            layout: settings.patch_layout(),
            flatten: settings.flatten_options(),
            extractor: Box::new(ArchiveExtractor),
            patch_tool: Box::new(settings.patch_tool()),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_patch_tool(mut self, tool: impl PatchTool + 'static) -> Self {
        self.patch_tool = Box::new(tool);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for cancelling a run from another thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn install(&self, request: &RunRequest) -> InstallResult<InstallReport> {
        self.install_with_progress(request, |_| {})
    }

    /// Run the whole pipeline, reporting each step through `on_event`.
    ///
    /// Per-package extraction and patch failures are recorded in the report.
    /// Workspace failures, copy failures while building the output,
    /// cancellation and a held run lock abort with an [`InstallError`].
    pub fn install_with_progress<F>(
        &self,
        request: &RunRequest,
        mut on_event: F,
    ) -> InstallResult<InstallReport>
    where
        F: FnMut(InstallEvent),
    {
        let ws = &request.workspace;
        check_layout(ws)?;
        let _lock = RunLock::acquire(&[&ws.base_install, &ws.package_root])?;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Local::now().to_rfc3339();
        let total_steps = request.total_steps();

        log::info!(
            "Install {run_id} started: {} loose, {} patched package(s)",
            request.loose.len(),
            request.patched.len()
        );
        on_event(InstallEvent::Started {
            run_id: run_id.clone(),
            total_steps,
        });

        reset_workspace(ws)?;

        let mut step = 0usize;
        let mut outcomes = Vec::with_capacity(request.loose.len() + request.patched.len());
        let mut loose_dirs = Vec::new();

        // Loose packages: extract only, one staging folder each.
        for package in &request.loose {
            self.check_cancelled()?;
            step += 1;
            on_event(package_started(step, total_steps, package));

            let mut outcome = PackageOutcome::new(package);
            match self.stage(package, &ws.loose_staging) {
                Ok(staged) => {
                    outcome.files_extracted = Some(staged.files);
                    outcome.staging_dir = Some(staged.dir.clone());
                    loose_dirs.push(staged.dir);
                }
                Err(e) => {
                    log::warn!("Skipping loose package {}: {e}", package.name());
                    outcome.failure = Some(PackageFailure::Extract(e));
                }
            }

            on_event(package_finished(step, total_steps, &outcome));
            outcomes.push(outcome);
        }

        // Patchers expect the talk table next to the game files.
        if let Some(tlk) = loose_dirs
            .iter()
            .rev()
            .find_map(|dir| file_utils::find_child_ci(dir, DIALOG_TLK, false))
        {
            log::info!("Seeding base install with {}", tlk.display());
            file_utils::copy_file(
                &tlk,
                &ws.base_install.join(DIALOG_TLK),
                self.flatten.preserve_mtime,
            )?;
        }

        // Patched packages: extract, then run the patcher against the base install.
        for package in &request.patched {
            self.check_cancelled()?;
            step += 1;
            on_event(package_started(step, total_steps, package));

            let mut outcome = PackageOutcome::new(package);
            match self.stage(package, &ws.patch_staging) {
                Ok(staged) => {
                    outcome.files_extracted = Some(staged.files);
                    outcome.staging_dir = Some(staged.dir.clone());

                    let snapshot = snapshot_base(ws)?;
                    let result = patcher::apply_patch(
                        &outcome.name,
                        &staged.dir,
                        &ws.base_install,
                        &self.layout,
                        self.patch_tool.as_ref(),
                        &self.cancel,
                    );
                    if result.is_err() {
                        restore_base(ws, snapshot)?;
                    }

                    match result {
                        Ok(applied) => outcome.patch_log = Some(applied.log_path),
                        Err(PatchError::Cancelled { package }) => {
                            log::warn!("Install cancelled while patching {package}");
                            return Err(InstallError::Cancelled);
                        }
                        Err(e) => {
                            log::error!("Patch failed, base install rolled back: {e}");
                            let log_path = staged.dir.join(PATCHER_LOG);
                            outcome.patch_log = log_path.is_file().then_some(log_path);
                            outcome.failure = Some(PackageFailure::Patch(e));
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Skipping patched package {}: {e}", package.name());
                    outcome.failure = Some(PackageFailure::Extract(e));
                }
            }

            on_event(package_finished(step, total_steps, &outcome));
            outcomes.push(outcome);
        }

        self.check_cancelled()?;
        step += 1;
        on_event(InstallEvent::Combining { step, total_steps });
        self.combine(ws, &loose_dirs)?;

        let manifest =
            build_manifest(&ws.output).map_err(|e| InstallError::workspace(&ws.output, e))?;

        let report = InstallReport {
            run_id,
            started_at,
            finished_at: Local::now().to_rfc3339(),
            output_dir: ws.output.clone(),
            packages: outcomes,
            manifest,
        };

        let installed = report.installed_count();
        let failed = report.packages.len() - installed;
        log::info!(
            "Install {} finished: {installed} installed, {failed} failed, {} file(s) in {}",
            report.run_id,
            report.manifest.len(),
            report.output_dir.display()
        );
        on_event(InstallEvent::Finished {
            installed,
            failed,
            output_dir: report.output_dir.clone(),
        });

        Ok(report)
    }

    fn check_cancelled(&self) -> InstallResult<()> {
        if self.cancel.is_cancelled() {
            log::warn!("Install cancelled");
            return Err(InstallError::Cancelled);
        }
        Ok(())
    }

    /// Extract into a scratch folder, then move it into a fresh staging folder.
    /// A failed extraction leaves nothing behind under `staging_root`.
    fn stage(&self, package: &Package, staging_root: &Path) -> Result<Staged, ExtractError> {
        let archive = package
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| package.path.display().to_string());
        let io_err = |source: io::Error| ExtractError::Io {
            archive: archive.clone(),
            source,
        };

        let scratch = tempfile::Builder::new()
            .prefix(".extract-")
            .tempdir_in(staging_root)
            .map_err(io_err)?;

        let files = self.extractor.extract(&package.path, scratch.path())?;

        let dir = path_utils::unique_staging_dir(staging_root, &package.name());
        if let Err(e) = file_utils::merge_move_dir(scratch.path(), &dir) {
            if let Err(cleanup) = file_utils::remove_dir_if_exists(&dir) {
                log::warn!("Failed to remove {}: {cleanup}", dir.display());
            }
            return Err(io_err(e));
        }

        log::info!("Extracted {archive} ({files} file(s)) to {}", dir.display());
        Ok(Staged { dir, files })
    }

    /// Rebuild the output: patched base install first, loose packages on top.
    fn combine(&self, ws: &Workspace, loose_dirs: &[PathBuf]) -> InstallResult<()> {
        let override_out = ws.output.join(OVERRIDE_DIR);
        let modules_out = ws.output.join(MODULES_DIR);

        file_utils::reset_dir(&ws.output).map_err(|e| InstallError::workspace(&ws.output, e))?;
        for dir in [&override_out, &modules_out] {
            std::fs::create_dir_all(dir).map_err(|e| InstallError::workspace(dir, e))?;
        }

        if let Some(src) = file_utils::find_child_ci(&ws.base_install, OVERRIDE_DIR, true) {
            flatten::flatten(&src, &override_out, self.flatten)?;
        }
        if let Some(src) = file_utils::find_child_ci(&ws.base_install, MODULES_DIR, true) {
            flatten::flatten(&src, &modules_out, self.flatten)?;
        }
        if let Some(tlk) = file_utils::find_child_ci(&ws.base_install, DIALOG_TLK, false) {
            file_utils::copy_file(
                &tlk,
                &ws.output.join(DIALOG_TLK),
                self.flatten.preserve_mtime,
            )?;
        }

        for dir in loose_dirs {
            self.overlay_loose(dir, &ws.output)?;
        }
        Ok(())
    }

    fn overlay_loose(&self, package_dir: &Path, output: &Path) -> InstallResult<()> {
        log::info!("Overlaying {}", package_dir.display());

        let override_out = output.join(OVERRIDE_DIR);
        let entries = file_utils::sorted_entries(package_dir)
            .map_err(|e| InstallError::workspace(package_dir, e))?;

        let mut root_tlk = false;
        let mut nested_tlk: Option<PathBuf> = None;

        for entry in entries {
            if entry.is_file() {
                let Some(name) = entry.file_name() else {
                    continue;
                };
                if flatten::is_dialog_tlk(&entry) {
                    file_utils::copy_file(
                        &entry,
                        &output.join(DIALOG_TLK),
                        self.flatten.preserve_mtime,
                    )?;
                    root_tlk = true;
                } else {
                    file_utils::copy_file(
                        &entry,
                        &override_out.join(name),
                        self.flatten.preserve_mtime,
                    )?;
                }
            } else if entry.is_dir() {
                if let Some(tlk) = file_utils::find_child_ci(&entry, DIALOG_TLK, false) {
                    nested_tlk = Some(tlk);
                }
                let source = file_utils::find_child_ci(&entry, OVERRIDE_DIR, true)
                    .unwrap_or_else(|| entry.clone());
                let summary = flatten::flatten(&source, &override_out, self.flatten)?;
                if let Some(tlk) = summary.skipped_tlk.into_iter().last() {
                    nested_tlk = Some(tlk);
                }
            }
        }

        if !root_tlk {
            if let Some(tlk) = nested_tlk {
                log::info!("Promoting {} to output root", tlk.display());
                file_utils::copy_file(&tlk, &output.join(DIALOG_TLK), self.flatten.preserve_mtime)?;
            }
        }
        Ok(())
    }
}

/// Run one install with the default extractor and patch tool for `settings`.
pub fn install(settings: &InstallerSettings, request: &RunRequest) -> InstallResult<InstallReport> {
    Installer::new(settings).install(request)
}

fn package_started(step: usize, total_steps: usize, package: &Package) -> InstallEvent {
    InstallEvent::PackageStarted {
        step,
        total_steps,
        name: package.name(),
        kind: package.kind,
    }
}

fn package_finished(step: usize, total_steps: usize, outcome: &PackageOutcome) -> InstallEvent {
    InstallEvent::PackageFinished {
        step,
        total_steps,
        name: outcome.name.clone(),
        kind: outcome.kind,
        error: outcome.failure.as_ref().map(|f| f.to_string()),
    }
}

/// The run wipes every workspace folder, so none may contain another.
/// Paths are resolved first so different spellings of one folder still collide.
fn check_layout(ws: &Workspace) -> InstallResult<()> {
    let mut dirs = Vec::with_capacity(4);
    for dir in [
        &ws.base_install,
        &ws.loose_staging,
        &ws.patch_staging,
        &ws.output,
    ] {
        let resolved =
            path_utils::resolve_path(dir).map_err(|e| InstallError::workspace(dir, e))?;
        dirs.push((dir, resolved));
    }

    for (i, (a, resolved_a)) in dirs.iter().enumerate() {
        for (b, resolved_b) in &dirs[i + 1..] {
            if resolved_a.starts_with(resolved_b) || resolved_b.starts_with(resolved_a) {
                return Err(InstallError::workspace(
                    a.as_path(),
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("overlaps with {}", b.display()),
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Copy the base install aside so a failed patcher can be undone.
fn snapshot_base(ws: &Workspace) -> InstallResult<TempDir> {
    let snapshot = tempfile::Builder::new()
        .prefix(".snapshot-")
        .tempdir_in(&ws.patch_staging)
        .map_err(|e| InstallError::workspace(&ws.patch_staging, e))?;
    file_utils::copy_dir_contents(&ws.base_install, snapshot.path())
        .map_err(|e| InstallError::workspace(&ws.base_install, e))?;
    Ok(snapshot)
}

fn restore_base(ws: &Workspace, snapshot: TempDir) -> InstallResult<()> {
    file_utils::remove_dir_if_exists(&ws.base_install)
        .map_err(|e| InstallError::workspace(&ws.base_install, e))?;
    file_utils::merge_move_dir(snapshot.path(), &ws.base_install)
        .map_err(|e| InstallError::workspace(&ws.base_install, e))
}

fn reset_workspace(ws: &Workspace) -> InstallResult<()> {
    for dir in [&ws.base_install, &ws.loose_staging, &ws.patch_staging] {
        file_utils::reset_dir(dir).map_err(|e| InstallError::workspace(dir, e))?;
    }
    ws.prepare()
        .map_err(|e| InstallError::workspace(&ws.base_install, e))
}
