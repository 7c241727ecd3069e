//! Per-record suppression of re-delivery.

use std::collections::HashMap;

use crate::store::Ticks;

/// Last visit tick observed for each record id.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    entries: HashMap<i64, Ticks>,
}

impl SeenSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `id` was already processed at `last_visit` or later.
    #[must_use]
    pub fn covers(&self, id: i64, last_visit: Ticks) -> bool {
        self.entries.get(&id).is_some_and(|&seen| seen >= last_visit)
    }

    /// Record `id` as processed at `last_visit`. Never moves an entry backwards.
    pub fn record(&mut self, id: i64, last_visit: Ticks) {
        let entry = self.entries.entry(id).or_insert(last_visit);
        if *entry < last_visit {
            *entry = last_visit;
        }
    }

    /// Drop entries older than `horizon`. Returns how many were removed.
    pub fn evict_before(&mut self, horizon: Ticks) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, &mut tick| tick >= horizon);
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<Ticks> {
        self.entries.get(&id).copied()
    }
}
