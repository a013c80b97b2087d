//! Merge pipeline: turns two ordered package lists into one output tree.
//!
//! Loose packages are extracted and overlaid last so they win over anything
//! the patchers produced. Patched packages run, in order, against a
//! disposable copy of the game install whose `Override` and `Modules`
//! folders are then flattened into the output.

pub mod cleanup;
pub mod manifest;
pub mod orchestrator;
pub mod report;
pub mod types;

pub use cleanup::{cleanup, CleanupSummary};
pub use manifest::{build_manifest, ManifestEntry};
pub use orchestrator::{install, Installer};
pub use report::{InstallEvent, InstallReport, PackageFailure, PackageOutcome};
pub use types::{LoadOrder, Package, PackageKind, RunRequest, Workspace, MODULES_DIR, OVERRIDE_DIR};

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod types_tests;

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod orchestrator_tests;
