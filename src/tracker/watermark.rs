//! Watermark tracking across polling cycles.

use crate::store::{HistoryRecord, Ticks};

use super::keywords::KeywordSet;
use super::seen::SeenSet;

/// A record that matched at least one keyword and has not been delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMatch {
    pub record: HistoryRecord,
    pub keywords: Vec<String>,
}

/// Result of classifying one cycle's batch.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// New matches, in store order.
    pub matches: Vec<PendingMatch>,
    /// Records examined, matched or not.
    pub examined: usize,
    /// Records skipped because the seen set already covers them.
    pub suppressed: usize,
    /// Highest `last_visit` over every examined record.
    pub max_tick: Option<Ticks>,
}

/// Watermark movement at the end of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub before: Ticks,
    pub after: Ticks,
    pub evicted: usize,
}

/// Dedup and watermark state owned by a single watcher.
///
/// Every record with `last_visit` below the watermark has been considered.
/// The watermark never decreases.
#[derive(Debug, Clone)]
pub struct Tracker {
    watermark: Ticks,
    seen: SeenSet,
    retention: Ticks,
}

impl Tracker {
    /// Start at `watermark`; seen entries older than `watermark - retention`
    /// are evicted after each advance.
    #[must_use]
    pub fn new(watermark: Ticks, retention: Ticks) -> Self {
        Self {
            watermark,
            seen: SeenSet::new(),
            retention: retention.max(0),
        }
    }

    #[must_use]
    pub fn watermark(&self) -> Ticks {
        self.watermark
    }

    /// Lower bound for the range query: rows strictly after this tick are
    /// at or after the watermark.
    #[must_use]
    pub fn query_after(&self) -> Ticks {
        self.watermark.saturating_sub(1)
    }

    #[must_use]
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Classify a batch ordered ascending by `last_visit`.
    ///
    /// Pure with respect to tracker state: call [`Tracker::mark_processed`]
    /// per delivered match and [`Tracker::advance`] once the batch is done.
    #[must_use]
    pub fn scan(&self, records: &[HistoryRecord], keywords: &KeywordSet) -> Scan {
        let mut scan = Scan::default();
        for record in records {
            scan.examined += 1;
            let tick = record.last_visit;
            scan.max_tick = Some(scan.max_tick.map_or(tick, |m| m.max(tick)));

            if self.seen.covers(record.id, record.last_visit) {
                tracing::trace!(id = record.id, last_visit = tick, "Already processed");
                scan.suppressed += 1;
                continue;
            }

            let matched = keywords.matches(record.title_or_empty(), &record.url);
            if matched.is_empty() {
                continue;
            }
            scan.matches.push(PendingMatch {
                record: record.clone(),
                keywords: matched,
            });
        }
        scan
    }

    /// Mark a match as handled, whatever the delivery outcome.
    pub fn mark_processed(&mut self, id: i64, last_visit: Ticks) {
        self.seen.record(id, last_visit);
    }

    /// Move the watermark past `max_tick` and evict stale seen entries.
    ///
    /// `None` (an empty cycle) leaves the watermark where it is.
    pub fn advance(&mut self, max_tick: Option<Ticks>) -> Advance {
        let before = self.watermark;
        if let Some(max_tick) = max_tick {
            self.watermark = self.watermark.max(max_tick.saturating_add(1));
        }
        let evicted = self
            .seen
            .evict_before(self.watermark.saturating_sub(self.retention));
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.seen.len(), "Evicted seen entries");
        }
        Advance {
            before,
            after: self.watermark,
            evicted,
        }
    }
}
