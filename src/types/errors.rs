use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to unpack one package archive. Recorded per package; never fatal.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported archive format: {archive}")]
    Unsupported { archive: String },
    #[error("Password required to extract {archive}")]
    PasswordProtected { archive: String },
    #[error("Invalid or corrupt archive {archive}: {message}")]
    Corrupt { archive: String, message: String },
    #[error("I/O error while extracting {archive}: {source}")]
    Io {
        archive: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub fn archive(&self) -> &str {
        match self {
            Self::Unsupported { archive }
            | Self::PasswordProtected { archive }
            | Self::Corrupt { archive, .. }
            | Self::Io { archive, .. } => archive,
        }
    }
}

/// Failure to apply one patcher package. Recorded per package; never fatal.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("{package}: no '{data_dir}' directory found")]
    MissingPatchData { package: String, data_dir: String },
    #[error("{package}: patcher executable not found in {}", .root.display())]
    MissingExecutable { package: String, root: PathBuf },
    #[error("{package}: failed to start patcher: {source}")]
    Spawn {
        package: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{package}: patcher exited with {}", .code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    ExitStatus { package: String, code: Option<i32> },
    #[error("{package}: patcher did not finish within {secs}s and was killed")]
    TimedOut { package: String, secs: u64 },
    #[error("{package}: patcher I/O error: {source}")]
    Io {
        package: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{package}: patcher interrupted by cancellation")]
    Cancelled { package: String },
}

impl PatchError {
    pub fn package(&self) -> &str {
        match self {
            Self::MissingPatchData { package, .. }
            | Self::MissingExecutable { package, .. }
            | Self::Spawn { package, .. }
            | Self::ExitStatus { package, .. }
            | Self::TimedOut { package, .. }
            | Self::Io { package, .. }
            | Self::Cancelled { package } => package,
        }
    }
}

/// A file could not be written into the merge output. Aborts the run.
#[derive(Debug, Error)]
#[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
pub struct FatalCopyError {
    pub from: PathBuf,
    pub to: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Run-level failures. Anything here means the output tree must not be shipped.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    FatalCopy(#[from] FatalCopyError),
    #[error("Workspace error at {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Install in progress for {}. Please wait.", .path.display())]
    Busy { path: PathBuf },
    #[error("Install cancelled")]
    Cancelled,
}

impl InstallError {
    pub fn workspace(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Workspace {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write settings {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid setting '{key}': {message}")]
    Invalid { key: String, message: String },
}

macro_rules! serialize_as_display {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: serde::Serializer,
                {
                    serializer.serialize_str(self.to_string().as_ref())
                }
            }
        )*
    };
}

serialize_as_display!(ExtractError, PatchError, FatalCopyError, InstallError, ConfigError);

pub type InstallResult<T> = Result<T, InstallError>;

#[cfg(test)]
#[path = "tests/errors_tests.rs"]
mod tests;
