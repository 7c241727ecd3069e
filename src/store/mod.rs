//! Access to the browser's `History` store.
//!
//! The store is a `SQLite` file owned and locked by the running browser, so it
//! is never opened in place: each cycle copies it to a local snapshot and
//! queries the copy.

mod discovery;
mod error;
mod query;
mod record;
mod snapshot;
pub mod timestamp;

pub use discovery::{candidate_history_paths, find_history_path};
pub use error::StoreError;
pub use query::{query_after, VISITS_QUERY};
pub use record::HistoryRecord;
pub use snapshot::{SnapshotAcquirer, DEFAULT_SNAPSHOT_FILE};
pub use timestamp::Ticks;
