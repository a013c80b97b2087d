use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use patchmerge_lib::services::archive::supports_archive;
use patchmerge_lib::services::config::{self, InstallerSettings};
use patchmerge_lib::services::flatten::WalkOrder;
use patchmerge_lib::services::installer::{
    self, InstallEvent, InstallReport, Installer, RunRequest, Workspace,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const SETTINGS_FILE: &str = "patchmerge.json";

#[derive(Parser)]
#[command(name = "patchmerge")]
#[command(author, version, about = "Merge loose-file and patcher mods into one deployable folder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Folder holding the base install copy, staging areas and output
    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,

    /// Settings file (default: <workspace>/patchmerge.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the output tree from the given packages
    Install {
        /// Loose-file archives, in load order (later wins)
        #[arg(long, num_args = 1..)]
        loose: Vec<PathBuf>,
        /// Patcher archives, applied in this order
        #[arg(long, num_args = 1..)]
        patched: Vec<PathBuf>,
        /// Write the merged tree here instead of the configured package folder
        #[arg(long)]
        output: Option<PathBuf>,
        /// Seconds to wait for each patcher before killing it
        #[arg(long)]
        timeout: Option<u64>,
        /// Flatten in filesystem order instead of sorted order
        #[arg(long)]
        native_order: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Remove the base install copy and staging folders afterwards
        #[arg(long)]
        clean: bool,
    },
    /// Remove the base install copy and staging folders
    Clean {
        /// Also remove the package folder
        #[arg(long)]
        remove_output: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.workspace.join(SETTINGS_FILE));
    let mut settings = config::load_settings(&config_path)?;

    match cli.command {
        Commands::Install {
            loose,
            patched,
            output,
            timeout,
            native_order,
            json,
            clean,
        } => {
            if let Some(secs) = timeout {
                settings.patch_timeout_secs = Some(secs);
            }
            if native_order {
                settings.walk_order = WalkOrder::Native;
            }

            let workspace = workspace_for(&cli.workspace, &settings, output)?;
            let mut request = RunRequest::new(workspace);
            request.loose.extend(loose);
            request.patched.extend(patched);
            warn_unusable(&request);

            let report = Installer::new(&settings)
                .install_with_progress(&request, log_event)
                .context("Install failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report);
            }

            if clean {
                installer::cleanup(&request.workspace, false).context("Cleanup failed")?;
            }

            Ok(if report.all_succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Commands::Clean { remove_output } => {
            let workspace = workspace_for(&cli.workspace, &settings, None)?;
            let summary = installer::cleanup(&workspace, remove_output)?;
            for path in &summary.removed {
                println!("removed {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn workspace_for(
    root: &Path,
    settings: &InstallerSettings,
    output: Option<PathBuf>,
) -> Result<Workspace> {
    let workspace = Workspace::from_settings(root, settings)?;
    Ok(match output {
        Some(dir) => workspace.with_output(dir),
        None => workspace,
    })
}

fn warn_unusable(request: &RunRequest) {
    for package in request.loose.iter().chain(request.patched.iter()) {
        if !package.path.is_file() {
            log::warn!("{} does not exist", package.path.display());
        } else if !supports_archive(&package.path) {
            log::warn!(
                "{} is not a .zip, .7z or .rar archive and will be skipped",
                package.path.display()
            );
        }
    }
}

fn log_event(event: InstallEvent) {
    match event {
        InstallEvent::PackageStarted {
            step,
            total_steps,
            name,
            kind,
        } => log::info!("[{step}/{total_steps}] {name} ({kind:?})"),
        InstallEvent::PackageFinished {
            name,
            error: Some(error),
            ..
        } => log::warn!("{name} failed: {error}"),
        InstallEvent::Combining { step, total_steps } => {
            log::info!("[{step}/{total_steps}] Combining output")
        }
        _ => {}
    }
}

fn print_summary(report: &InstallReport) {
    println!(
        "{} of {} package(s) installed into {}",
        report.installed_count(),
        report.packages.len(),
        report.output_dir.display()
    );
    for outcome in report.failed() {
        if let Some(failure) = &outcome.failure {
            println!("  FAILED {}: {failure}", outcome.name);
        }
        if let Some(log_path) = &outcome.patch_log {
            println!("         patcher log: {}", log_path.display());
        }
    }
}
