//! History row model.

use serde::{Deserialize, Serialize};

use super::timestamp::Ticks;

/// A single row of the browser's `urls` table.
///
/// `id` is local to the store file; it is assumed stable across snapshots of
/// the same profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub last_visit: Ticks,
}

impl HistoryRecord {
    /// Title, or an empty string when the store has none.
    #[must_use]
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }
}
