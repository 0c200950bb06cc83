//! Typed error definitions for xmv.
//! Every failed run maps to exactly one of these kinds, so callers get a
//! boolean-equivalent outcome plus a reason (and the binary an exit code).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmvError {
    #[error("Source file not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Source is not a regular file: {0}")]
    NotRegularFile(PathBuf),

    #[error("Both inputs refer to the same file: {0}")]
    SameFile(PathBuf),

    #[error("Insufficient disk space for {dest}: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        required: u128,
        available: u128,
        dest: PathBuf,
    },

    #[error("Destination directory does not exist and creation was not approved: {0}")]
    DirectoryMissing(PathBuf),

    #[error("Destination already exists and overwrite was not approved: {0}")]
    DestinationConflict(PathBuf),

    #[error("Both files would land on the same path: {0}")]
    DestinationCollision(PathBuf),

    #[error("I/O failure during {step} on {path}: {source}")]
    Io {
        step: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Integrity check failed for {produced}: expected sha256 {expected}, got {actual}")]
    IntegrityMismatch {
        produced: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Rename '{from}' -> '{to}' failed{}: {source}", parked_suffix(.parked))]
    RenameFailure {
        from: PathBuf,
        to: PathBuf,
        /// Files left under a temporary name that need manual recovery.
        parked: Vec<PathBuf>,
        #[source]
        source: io::Error,
    },

    #[error("Operation interrupted by user before any change was made")]
    Interrupted,
}

fn parked_suffix(parked: &[PathBuf]) -> String {
    if parked.is_empty() {
        return String::new();
    }
    let names: Vec<String> = parked.iter().map(|p| p.display().to_string()).collect();
    format!(" (left parked: {})", names.join(", "))
}

impl XmvError {
    /// Build an `Io` error for a named step; handy with `map_err`.
    pub fn io<'a>(step: &'static str, path: &'a std::path::Path) -> impl FnOnce(io::Error) -> XmvError + 'a {
        move |source| XmvError::Io {
            step,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Stable machine-readable name of the failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            XmvError::SourceMissing(_) => "source_missing",
            XmvError::NotRegularFile(_) => "not_regular_file",
            XmvError::SameFile(_) => "same_file",
            XmvError::InsufficientSpace { .. } => "insufficient_space",
            XmvError::DirectoryMissing(_) => "directory_missing",
            XmvError::DestinationConflict(_) => "destination_conflict",
            XmvError::DestinationCollision(_) => "destination_collision",
            XmvError::Io { .. } => "io_failure",
            XmvError::IntegrityMismatch { .. } => "integrity_mismatch",
            XmvError::RenameFailure { .. } => "rename_failure",
            XmvError::Interrupted => "interrupted",
        }
    }

    /// Process exit code for this failure. 0 is reserved for success and 1 for
    /// errors that never became an `XmvError` (bad config, logging setup).
    pub fn code(&self) -> u8 {
        match self {
            XmvError::SourceMissing(_) | XmvError::NotRegularFile(_) | XmvError::SameFile(_) => 2,
            XmvError::InsufficientSpace { .. } => 3,
            XmvError::DirectoryMissing(_) => 4,
            XmvError::DestinationConflict(_) | XmvError::DestinationCollision(_) => 5,
            XmvError::Io { .. } => 6,
            XmvError::IntegrityMismatch { .. } => 7,
            XmvError::RenameFailure { .. } => 8,
            XmvError::Interrupted => 130,
        }
    }

    /// True when the failure happened before anything on disk was modified.
    pub fn is_side_effect_free(&self) -> bool {
        !matches!(self, XmvError::RenameFailure { parked, .. } if !parked.is_empty())
    }
}
