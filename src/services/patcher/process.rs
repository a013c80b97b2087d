use super::{PatchInvocation, PatchTool};
use crate::services::core::cancel::CancelFlag;
use crate::types::errors::PatchError;
use std::fs;
use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// How often a running patcher is checked for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Runs the patcher as a child process and waits for it.
///
/// With a `launcher` (e.g. `wine`) the executable path becomes the launcher's
/// first argument. A `timeout` of `None` waits indefinitely.
#[derive(Debug, Clone, Default)]
pub struct ProcessPatchTool {
    pub launcher: Option<std::path::PathBuf>,
    pub timeout: Option<Duration>,
}

impl ProcessPatchTool {
    pub fn new(launcher: Option<std::path::PathBuf>, timeout: Option<Duration>) -> Self {
        Self { launcher, timeout }
    }

    fn command(&self, invocation: &PatchInvocation<'_>) -> Command {
        let mut cmd = match &self.launcher {
            Some(launcher) => {
                let mut cmd = Command::new(launcher);
                cmd.arg(invocation.executable);
                cmd
            }
            None => Command::new(invocation.executable),
        };
        cmd.arg(invocation.target).current_dir(invocation.patch_root);
        cmd
    }
}

impl PatchTool for ProcessPatchTool {
    fn run(&self, invocation: &PatchInvocation<'_>, cancel: &CancelFlag) -> Result<(), PatchError> {
        let package = invocation.package.to_string();
        let io_err = |source: io::Error| PatchError::Io {
            package: invocation.package.to_string(),
            source,
        };

        let log_file = fs::File::create(invocation.log_path).map_err(io_err)?;
        let log_file_err = log_file.try_clone().map_err(io_err)?;

        log::info!(
            "Running patcher {} against {}",
            invocation.executable.display(),
            invocation.target.display()
        );

        let mut child = self
            .command(invocation)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_file_err))
            .spawn()
            .map_err(|source| PatchError::Spawn {
                package: package.clone(),
                source,
            })?;

        let started = Instant::now();
        loop {
            if cancel.is_cancelled() {
                stop_child(&mut child, invocation.package);
                return Err(PatchError::Cancelled { package });
            }

            let slice = match self.timeout {
                Some(limit) => {
                    let elapsed = started.elapsed();
                    if elapsed >= limit {
                        stop_child(&mut child, invocation.package);
                        return Err(PatchError::TimedOut {
                            package,
                            secs: limit.as_secs(),
                        });
                    }
                    (limit - elapsed).min(POLL_INTERVAL)
                }
                None => POLL_INTERVAL,
            };

            let waited = child.wait_timeout(slice);
            if let Some(status) = settle_wait(&mut child, waited, invocation.package)
                .map_err(io_err)?
            {
                log::debug!(
                    "Patcher for {} exited after {:?}: {status}",
                    invocation.package,
                    started.elapsed()
                );
                return if status.success() {
                    Ok(())
                } else {
                    Err(PatchError::ExitStatus {
                        package,
                        code: status.code(),
                    })
                };
            }
        }
    }
}

/// Passes a wait result through, stopping the child first when waiting failed.
pub(crate) fn settle_wait(
    child: &mut Child,
    waited: io::Result<Option<ExitStatus>>,
    package: &str,
) -> io::Result<Option<ExitStatus>> {
    if waited.is_err() {
        stop_child(child, package);
    }
    waited
}

fn stop_child(child: &mut Child, package: &str) {
    if let Err(e) = child.kill() {
        log::warn!("Failed to kill patcher for {package}: {e}");
    }
    let _ = child.wait();
}
