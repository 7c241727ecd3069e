//! Watch loop state machine.

use serde::{Deserialize, Serialize};

/// Phase of the polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchState {
    #[default]
    Idle,
    Snapshotting,
    Querying,
    Processing,
    Sleeping,
    Stopped,
}

/// Tracks the current phase and lifetime counters.
#[derive(Debug, Clone, Default)]
pub struct WatchStateMachine {
    state: WatchState,
    stats: WatchStats,
}

impl WatchStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn transition(&mut self, new_state: WatchState) {
        tracing::trace!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
    }

    pub fn record_cycle(&mut self) {
        self.stats.cycles = self.stats.cycles.saturating_add(1);
    }

    pub fn record_skip(&mut self) {
        self.stats.skipped_cycles = self.stats.skipped_cycles.saturating_add(1);
    }

    pub fn record_match(&mut self) {
        self.stats.matches = self.stats.matches.saturating_add(1);
    }

    pub fn record_delivery(&mut self, delivered: bool) {
        if delivered {
            self.stats.delivered = self.stats.delivered.saturating_add(1);
        } else {
            self.stats.failed = self.stats.failed.saturating_add(1);
        }
    }

    /// A delivery abandoned because shutdown was requested.
    pub fn record_interrupted(&mut self) {
        self.stats.interrupted = self.stats.interrupted.saturating_add(1);
    }

    #[must_use]
    pub fn stats(&self) -> WatchStats {
        self.stats
    }
}

/// Lifetime counters of a watcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchStats {
    pub cycles: u64,
    pub skipped_cycles: u64,
    pub matches: u64,
    pub delivered: u64,
    pub failed: u64,
    pub interrupted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let machine = WatchStateMachine::new();
        assert_eq!(machine.state(), WatchState::Idle);
        assert_eq!(machine.stats(), WatchStats::default());
    }

    #[test]
    fn test_counters() {
        let mut machine = WatchStateMachine::new();
        machine.transition(WatchState::Snapshotting);
        machine.record_cycle();
        machine.record_cycle();
        machine.record_skip();
        machine.record_match();
        machine.record_match();
        machine.record_delivery(true);
        machine.record_delivery(false);
        machine.record_interrupted();

        let stats = machine.stats();
        assert_eq!(machine.state(), WatchState::Snapshotting);
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.skipped_cycles, 1);
        assert_eq!(stats.matches, 2);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.interrupted, 1);
    }
}
