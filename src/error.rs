//! Error types and exit codes for the installer
//!
//! Every failure is an [`InstallerError`]. The orchestrator wraps it in a
//! [`RunError`] that remembers which operation was running, which is what
//! decides the process exit code.

use std::path::PathBuf;

use thiserror::Error;

use crate::version::VersionError;

// ============================================================================
// Exit Codes
// ============================================================================

/// Process exit codes understood by calling scripts and the companion launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitResult {
    BopimoNotInstalled = -10,
    FetchLatestFailed = -9,
    UpdateCheckFailed = -8,
    DownloadFailed = -7,
    ExtractionFailed = -6,
    UninstallFailed = -5,
    ReinstallFailed = -4,
    UpdateFailed = -3,
    InstallFailed = -2,
    Failed = -1,
    Success = 0,
    Unknown = 1,
    InstallSuccess = 2,
    UpdateSuccess = 3,
    ReinstallSuccess = 4,
    UninstallSuccess = 5,
    Unchanged = 10,
}

impl ExitResult {
    pub fn code(self) -> i32 {
        self as i32
    }
}

// ============================================================================
// Installer Error
// ============================================================================

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("Bopimo! is not installed (no client directory at {})", path.display())]
    TargetNotFound { path: PathBuf },

    #[error("Failed to fetch latest release info from {url}: {reason}")]
    MetadataFetch { url: String, reason: String },

    #[error("Failed to download {url}: {reason}")]
    ArtifactDownload { url: String, reason: String },

    #[error("Failed to extract mod loader package: {reason}")]
    Extraction { reason: String },

    #[error("Version check failed: {0}")]
    Version(#[from] VersionError),

    #[error("Failed to read {}: {reason}", path.display())]
    ConfigRead { path: PathBuf, reason: String },

    #[error("Failed to write {}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Section [{section}] not found in override store")]
    SectionNotFound { section: String },

    #[error("Key '{key}' not found in section [{section}]")]
    KeyNotFound { section: String, key: String },

    #[error("Cannot store [{section}] {key}: {reason}")]
    InvalidEntry {
        section: String,
        key: String,
        reason: String,
    },

    #[error("Failed to link companion override store at {}", link.display())]
    LinkCreation {
        link: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {}", path.display())]
    Removal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InstallerError {
    /// Exit code tied to the error itself, if it has one of its own
    fn specific_exit(&self) -> Option<ExitResult> {
        match self {
            InstallerError::TargetNotFound { .. } => Some(ExitResult::BopimoNotInstalled),
            InstallerError::MetadataFetch { .. } => Some(ExitResult::FetchLatestFailed),
            InstallerError::Version(_) => Some(ExitResult::UpdateCheckFailed),
            InstallerError::ArtifactDownload { .. } => Some(ExitResult::DownloadFailed),
            InstallerError::Extraction { .. } => Some(ExitResult::ExtractionFailed),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, InstallerError>;

// ============================================================================
// Run Error
// ============================================================================

/// Operations the orchestrator can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Install,
    Update,
    Reinstall,
    Uninstall,
}

impl Operation {
    fn failure_exit(self) -> ExitResult {
        match self {
            Operation::Install => ExitResult::InstallFailed,
            Operation::Update => ExitResult::UpdateFailed,
            Operation::Reinstall => ExitResult::ReinstallFailed,
            Operation::Uninstall => ExitResult::UninstallFailed,
        }
    }
}

/// A failed run: the error plus the operation that was in progress
#[derive(Error, Debug)]
#[error("{error}")]
pub struct RunError {
    pub operation: Option<Operation>,
    #[source]
    pub error: InstallerError,
}

impl RunError {
    pub fn new(operation: Option<Operation>, error: InstallerError) -> Self {
        Self { operation, error }
    }

    pub fn exit_result(&self) -> ExitResult {
        self.error
            .specific_exit()
            .or_else(|| self.operation.map(Operation::failure_exit))
            .unwrap_or(ExitResult::Failed)
    }
}
