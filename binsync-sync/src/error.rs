//! Error types for binsync-sync.

use std::path::PathBuf;

use binsync_core::InstalledFilenames;
use thiserror::Error;

/// Errors that abort a copy.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source directory could not be listed.
    #[error("cannot read source directory {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the temp file or renaming it over the target failed.
    #[error("atomic copy to {path} failed: {source}")]
    AtomicCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A fatal copy error together with everything installed before it.
#[derive(Debug, Error)]
#[error("copy aborted after installing {} file(s)", .installed.len())]
pub struct CopyFailure {
    /// Names fully installed to all of their writable targets.
    pub installed: InstalledFilenames,
    #[source]
    pub error: SyncError,
}

/// Why a target directory was judged not writable. Never fatal.
#[derive(Debug, Error)]
pub enum WritabilityError {
    #[error("{path} does not exist")]
    Missing { path: PathBuf },

    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("{path} is not writable: {source}")]
    Denied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::SourceRead`].
pub(crate) fn source_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::SourceRead {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::AtomicCopy`].
pub(crate) fn copy_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::AtomicCopy {
        path: path.into(),
        source,
    }
}
