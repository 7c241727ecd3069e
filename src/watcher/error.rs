//! Watch loop error types.

use crate::store::StoreError;

/// Errors that end a single polling cycle early.
///
/// None of these stop the watcher; the loop logs them and sleeps.
#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    /// The store could not be copied within the retry budget.
    #[error("Snapshot unavailable: {0}")]
    Snapshot(#[source] StoreError),

    /// The snapshot could not be queried.
    #[error("Query failed: {0}")]
    Query(#[source] StoreError),
}
