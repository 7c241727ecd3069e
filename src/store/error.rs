//! Store error types.

use std::path::PathBuf;

/// Errors that can occur while snapshotting or querying the history store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// A single copy attempt failed at the I/O level.
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The copy finished but the snapshot is empty or shorter than expected.
    #[error("Incomplete snapshot at {path}: expected {expected} bytes, found {actual}")]
    IncompleteSnapshot {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Every copy attempt failed.
    #[error("Snapshot copy failed after {attempts} attempt(s): {source}")]
    CopyFailed {
        attempts: u32,
        #[source]
        source: Box<StoreError>,
    },

    /// The snapshot could not be opened as a database.
    #[error("Failed to open snapshot {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The range query failed (corrupt snapshot, I/O error).
    #[error("History query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    /// Blocking task was cancelled.
    #[error("Blocking task cancelled")]
    TaskCancelled,
}
