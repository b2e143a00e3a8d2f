//! Error types for snapshot persistence.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for snapshot store operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors raised while loading or saving the run-to-run snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The persisted snapshot exists but is not a valid key/timestamp document.
    ///
    /// Never recovered from: treating it as empty would reset every event's
    /// creation and modification time to the current run.
    #[error("snapshot at {path} is corrupt: {reason}")]
    Corrupt {
        /// Location of the offending document.
        path: PathBuf,
        /// What failed to parse.
        reason: String,
    },

    /// An I/O error occurred reading or replacing the snapshot file.
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl SnapshotError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, SnapshotError::Corrupt { .. })
    }
}
