//! Watch loop orchestration.
//!
//! Connects the snapshot acquirer, query engine, tracker and delivery sink
//! into a strictly sequential polling loop.

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::error::WatchError;
use super::state::{WatchState, WatchStateMachine, WatchStats};
use crate::config::WatcherConfig;
use crate::delivery::{DeliverySink, MatchPayload};
use crate::display;
use crate::identity::Identity;
use crate::store::{self, HistoryRecord, SnapshotAcquirer, Ticks};
use crate::tracker::{KeywordSet, Tracker};

/// Outcome of one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub examined: usize,
    pub suppressed: usize,
    pub matched: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Deliveries cut short by shutdown; not counted as failures.
    pub interrupted: usize,
    pub watermark_before: Ticks,
    pub watermark_after: Ticks,
}

/// Watcher context: everything one polling loop owns.
///
/// Only the loop itself mutates the tracker, so no locking is involved.
pub struct Watcher<S> {
    acquirer: SnapshotAcquirer,
    keywords: KeywordSet,
    tracker: Tracker,
    sink: S,
    identity: Identity,
    poll_interval: Duration,
    machine: WatchStateMachine,
    cancel: CancellationToken,
}

impl<S: DeliverySink> Watcher<S> {
    #[must_use]
    pub fn new(
        acquirer: SnapshotAcquirer,
        keywords: KeywordSet,
        tracker: Tracker,
        sink: S,
        identity: Identity,
        poll_interval: Duration,
    ) -> Self {
        Self {
            acquirer,
            keywords,
            tracker,
            sink,
            identity,
            poll_interval,
            machine: WatchStateMachine::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Build a watcher for `history` from configuration, starting at
    /// `now - lookback`.
    #[must_use]
    pub fn from_config(
        config: &WatcherConfig,
        history: PathBuf,
        keywords: KeywordSet,
        sink: S,
        identity: Identity,
    ) -> Self {
        let acquirer = SnapshotAcquirer::new(
            history,
            config.snapshot.path.clone(),
            config.snapshot.retry_policy(),
        );
        let tracker = Tracker::new(config.initial_watermark(), config.seen_retention());
        Self::new(
            acquirer,
            keywords,
            tracker,
            sink,
            identity,
            config.poll_interval(),
        )
    }

    /// Use an externally owned token for graceful shutdown.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    #[must_use]
    pub fn state(&self) -> WatchState {
        self.machine.state()
    }

    #[must_use]
    pub fn stats(&self) -> WatchStats {
        self.machine.stats()
    }

    #[must_use]
    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Run one cycle: snapshot, query, match, deliver, advance.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::Snapshot` if the store could not be copied and
    /// `WatchError::Query` if the snapshot could not be read. The watermark
    /// is untouched in both cases.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, WatchError> {
        self.machine.record_cycle();

        self.machine.transition(WatchState::Snapshotting);
        self.acquirer
            .acquire(Some(&self.cancel))
            .await
            .map_err(WatchError::Snapshot)?;

        self.machine.transition(WatchState::Querying);
        let records = store::query_after(self.acquirer.dest(), self.tracker.query_after())
            .await
            .map_err(WatchError::Query)?;

        self.machine.transition(WatchState::Processing);
        Ok(self.process(&records).await)
    }

    async fn process(&mut self, records: &[HistoryRecord]) -> CycleReport {
        let scan = self.tracker.scan(records, &self.keywords);
        let mut report = CycleReport {
            examined: scan.examined,
            suppressed: scan.suppressed,
            matched: scan.matches.len(),
            watermark_before: self.tracker.watermark(),
            ..CycleReport::default()
        };

        for pending in &scan.matches {
            self.machine.record_match();
            let payload = MatchPayload::from_match(pending, &self.identity);
            match self.sink.deliver(&payload).await {
                Ok(()) => {
                    tracing::info!(
                        id = pending.record.id,
                        url = %payload.url,
                        keywords = ?payload.matched_keywords,
                        last_visit = %payload.observed_at,
                        "Match delivered"
                    );
                    display::print_sent(&payload);
                    report.delivered += 1;
                    self.machine.record_delivery(true);
                }
                Err(e) if e.is_interrupted() => {
                    tracing::info!(
                        id = pending.record.id,
                        url = %payload.url,
                        error = %e,
                        "Match delivery interrupted by shutdown"
                    );
                    display::print_interrupted(&payload);
                    report.interrupted += 1;
                    self.machine.record_interrupted();
                }
                Err(e) => {
                    tracing::warn!(
                        id = pending.record.id,
                        url = %payload.url,
                        keywords = ?payload.matched_keywords,
                        error = %e,
                        "Match delivery failed, dropping"
                    );
                    display::print_failed(&payload, &e.to_string());
                    report.failed += 1;
                    self.machine.record_delivery(false);
                }
            }
            self.tracker
                .mark_processed(pending.record.id, pending.record.last_visit);
        }

        let advance = self.tracker.advance(scan.max_tick);
        report.watermark_after = advance.after;
        tracing::debug!(
            examined = report.examined,
            suppressed = report.suppressed,
            matched = report.matched,
            delivered = report.delivered,
            failed = report.failed,
            interrupted = report.interrupted,
            watermark = advance.after,
            "Cycle complete"
        );
        report
    }

    /// Run one cycle and contain its failure.
    ///
    /// Returns `None` when the cycle was skipped.
    pub async fn tick(&mut self) -> Option<CycleReport> {
        match self.run_cycle().await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(error = %e, watermark = self.tracker.watermark(), "Cycle skipped");
                display::print_skipped(&e.to_string());
                self.machine.record_skip();
                None
            }
        }
    }

    /// Poll until the cancellation token fires.
    ///
    /// The token is checked at the sleep boundary and during retry delays;
    /// an in-flight copy or request is allowed to finish. The snapshot is
    /// removed on the way out.
    pub async fn run(&mut self) -> WatchStats {
        tracing::info!(
            source = %self.acquirer.source().display(),
            keywords = ?self.keywords.terms(),
            watermark = self.tracker.watermark(),
            interval_ms = u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX),
            "Watching history"
        );

        while !self.cancel.is_cancelled() {
            self.machine.transition(WatchState::Idle);
            self.tick().await;

            self.machine.transition(WatchState::Sleeping);
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {}
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("Stop requested, shutting down watcher");
        self.release().await;
        self.machine.stats()
    }

    /// Remove the snapshot and enter the terminal state.
    pub async fn release(&mut self) {
        self.acquirer.discard().await;
        self.machine.transition(WatchState::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rusqlite::{params, Connection};
    use tempfile::TempDir;

    use crate::delivery::DeliveryError;
    use crate::retry::RetryPolicy;

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<MatchPayload>>>,
        fail: bool,
        interrupt: bool,
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn deliver(&self, payload: &MatchPayload) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(payload.clone());
            if self.interrupt {
                Err(DeliveryError::Interrupted {
                    attempts: 1,
                    source: Box::new(DeliveryError::Rejected(503)),
                })
            } else if self.fail {
                Err(DeliveryError::Failed {
                    attempts: 2,
                    source: Box::new(DeliveryError::Rejected(503)),
                })
            } else {
                Ok(())
            }
        }
    }

    fn write_store(path: &std::path::Path, rows: &[(i64, &str, &str, i64)]) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS urls (id INTEGER PRIMARY KEY, url LONGVARCHAR,
                 title LONGVARCHAR, last_visit_time INTEGER NOT NULL);",
        )
        .unwrap();
        for (id, url, title, last_visit) in rows {
            conn.execute(
                "INSERT OR REPLACE INTO urls (id, url, title, last_visit_time) VALUES (?1, ?2, ?3, ?4)",
                params![id, url, title, last_visit],
            )
            .unwrap();
        }
    }

    fn watcher(dir: &TempDir, sink: RecordingSink, watermark: Ticks) -> Watcher<RecordingSink> {
        let acquirer = SnapshotAcquirer::new(
            dir.path().join("History"),
            dir.path().join("snap.db"),
            RetryPolicy::new(3, Duration::from_millis(1)),
        );
        Watcher::new(
            acquirer,
            KeywordSet::from_lines(["apple"]),
            Tracker::new(watermark, 0),
            sink,
            Identity {
                username: "tester".to_string(),
                source_ip: "127.0.0.1".to_string(),
            },
            Duration::from_millis(10),
        )
    }

    #[tokio::test]
    async fn test_cycle_delivers_match_once() {
        let dir = TempDir::new().unwrap();
        let t0 = 13_400_000_000_000_000;
        write_store(
            &dir.path().join("History"),
            &[(1, "https://example.com/search?q=apple", "apple - search", t0)],
        );
        let sink = RecordingSink::default();
        let mut watcher = watcher(&dir, sink.clone(), t0 - 10);

        let first = watcher.run_cycle().await.unwrap();
        assert_eq!(first.delivered, 1);
        assert_eq!(first.watermark_after, t0 + 1);

        let second = watcher.run_cycle().await.unwrap();
        assert_eq!(second.examined, 0);
        assert_eq!(second.delivered, 0);
        assert_eq!(watcher.tracker().watermark(), t0 + 1);

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].matched_keywords, vec!["apple"]);
        assert_eq!(sent[0].username, "tester");
        assert_eq!(watcher.state(), WatchState::Processing);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_advances() {
        let dir = TempDir::new().unwrap();
        write_store(&dir.path().join("History"), &[(4, "https://apple.example", "", 500)]);
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let mut watcher = watcher(&dir, sink.clone(), 100);

        let report = watcher.run_cycle().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.watermark_after, 501);
        assert_eq!(watcher.stats().failed, 1);

        let again = watcher.run_cycle().await.unwrap();
        assert_eq!(again.matched, 0);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_interrupted_delivery_is_not_a_failure() {
        let dir = TempDir::new().unwrap();
        write_store(&dir.path().join("History"), &[(4, "https://apple.example", "", 500)]);
        let sink = RecordingSink {
            interrupt: true,
            ..Default::default()
        };
        let mut watcher = watcher(&dir, sink, 100);

        let report = watcher.run_cycle().await.unwrap();
        assert_eq!(report.matched, 1);
        assert_eq!(report.interrupted, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(watcher.stats().interrupted, 1);
        assert_eq!(watcher.stats().failed, 0);
    }

    #[tokio::test]
    async fn test_missing_store_skips_cycle() {
        let dir = TempDir::new().unwrap();
        let mut watcher = watcher(&dir, RecordingSink::default(), 100);

        assert!(watcher.tick().await.is_none());
        assert_eq!(watcher.tracker().watermark(), 100);
        assert_eq!(watcher.stats().skipped_cycles, 1);
        assert_eq!(watcher.stats().cycles, 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel_and_removes_snapshot() {
        let dir = TempDir::new().unwrap();
        write_store(&dir.path().join("History"), &[(1, "https://x.example", "x", 500)]);
        let cancel = CancellationToken::new();
        let mut watcher =
            watcher(&dir, RecordingSink::default(), 100).with_cancellation(cancel.clone());

        let handle = tokio::spawn(async move {
            let stats = watcher.run().await;
            (stats, watcher.state())
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let (stats, state) = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(stats.cycles >= 1);
        assert_eq!(state, WatchState::Stopped);
        assert!(!dir.path().join("snap.db").exists());
    }
}
