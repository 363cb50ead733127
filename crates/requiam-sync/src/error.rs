//! Synchronization error types.

use std::path::PathBuf;
use thiserror::Error;

use requiam_core::CoreError;
use requiam_grouper::GrouperError;

use crate::report::{Phase, SyncReport};

/// Error raised by the reconciliation engine or the override store.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Rejected before any remote or file-system side effect.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Neither the override file nor its bundled template exists.
    #[error("override store missing: {path} (template {template} not found either)")]
    OverrideStoreMissing { path: PathBuf, template: PathBuf },

    /// An override file row could not be used.
    #[error("invalid override in {path} at line {line}: {message}")]
    InvalidOverride {
        path: PathBuf,
        line: u64,
        message: String,
    },

    /// A batch write failed below the result-code layer and the run stopped.
    ///
    /// `report` holds every batch completed before the failure.
    #[error("{phase} batch {batch} failed: {source}")]
    Transport {
        phase: Phase,
        batch: usize,
        report: Box<SyncReport>,
        #[source]
        source: GrouperError,
    },

    /// A registry call outside the batch loop failed.
    #[error(transparent)]
    Grouper(#[from] GrouperError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        SyncError::Csv {
            path: path.into(),
            source,
        }
    }

    /// The partial report carried by a transport abort.
    #[must_use]
    pub fn partial_report(&self) -> Option<&SyncReport> {
        match self {
            SyncError::Transport { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;
