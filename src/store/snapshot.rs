//! Snapshot acquisition for a store file locked by another process.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use super::error::StoreError;
use crate::retry::RetryPolicy;

/// Default snapshot file name, relative to the working directory.
pub const DEFAULT_SNAPSHOT_FILE: &str = "history-watcher.db";

/// Produces a complete local copy of the live history file.
///
/// Each attempt copies into a sibling `.partial` file, checks it, then
/// renames it over the destination, so the destination is never observed
/// half-written.
#[derive(Debug, Clone)]
pub struct SnapshotAcquirer {
    source: PathBuf,
    dest: PathBuf,
    retry: RetryPolicy,
}

impl SnapshotAcquirer {
    #[must_use]
    pub fn new(source: PathBuf, dest: PathBuf, retry: RetryPolicy) -> Self {
        Self {
            source,
            dest,
            retry,
        }
    }

    /// Path of the live store file.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Path of the snapshot queried each cycle.
    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = self.dest.as_os_str().to_owned();
        name.push(".partial");
        PathBuf::from(name)
    }

    /// Copy the store to the snapshot path within the retry budget.
    ///
    /// Returns the snapshot size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CopyFailed`] wrapping the last attempt's error
    /// once the budget is spent.
    pub async fn acquire(&self, cancel: Option<&CancellationToken>) -> Result<u64, StoreError> {
        let result = self
            .retry
            .run(cancel, |attempt| async move {
                tracing::trace!(attempt, source = %self.source.display(), "Copying history store");
                self.copy_once().await
            })
            .await;

        match result {
            Ok(bytes) => {
                tracing::debug!(bytes, dest = %self.dest.display(), "Snapshot acquired");
                Ok(bytes)
            }
            Err(exhausted) => {
                let _ = tokio::fs::remove_file(self.partial_path()).await;
                Err(StoreError::CopyFailed {
                    attempts: exhausted.attempts,
                    source: Box::new(exhausted.last),
                })
            }
        }
    }

    async fn copy_once(&self) -> Result<u64, StoreError> {
        let partial = self.partial_path();
        let copied = tokio::fs::copy(&self.source, &partial)
            .await
            .map_err(|source| StoreError::Copy {
                from: self.source.clone(),
                to: partial.clone(),
                source,
            })?;

        let actual = tokio::fs::metadata(&partial)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if actual == 0 || actual != copied {
            return Err(StoreError::IncompleteSnapshot {
                path: partial,
                expected: copied,
                actual,
            });
        }

        tokio::fs::rename(&partial, &self.dest)
            .await
            .map_err(|source| StoreError::Copy {
                from: partial.clone(),
                to: self.dest.clone(),
                source,
            })?;
        Ok(actual)
    }

    /// Remove the snapshot and any leftover partial copy. Best effort.
    pub async fn discard(&self) {
        for path in [self.dest.clone(), self.partial_path()] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed snapshot file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove snapshot file");
                }
            }
        }
    }
}
