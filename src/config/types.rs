//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use crate::store::{timestamp, Ticks, DEFAULT_SNAPSHOT_FILE};

/// Top-level watcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Explicit `History` file; discovered per platform when unset.
    pub history_path: Option<PathBuf>,
    /// Keyword file, one term per line.
    pub keywords_file: PathBuf,
    /// Pause between polling cycles.
    pub poll_interval_secs: u64,
    /// How far back the first cycle searches.
    pub lookback_days: u32,
    /// How long seen entries are kept behind the watermark.
    pub seen_retention_secs: u64,
    pub snapshot: SnapshotConfig,
    pub sink: SinkConfig,
    pub identity: IdentityConfig,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            history_path: None,
            keywords_file: PathBuf::from("keywords.txt"),
            poll_interval_secs: 2,
            lookback_days: 7,
            seen_retention_secs: 3600,
            snapshot: SnapshotConfig::default(),
            sink: SinkConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}

impl WatcherConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.lookback_days))
    }

    /// Seen-set retention expressed in store ticks.
    #[must_use]
    pub fn seen_retention(&self) -> Ticks {
        i64::try_from(self.seen_retention_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1_000_000)
    }

    /// Starting watermark for a watcher launched now.
    #[must_use]
    pub fn initial_watermark(&self) -> Ticks {
        timestamp::lookback_start(chrono::Utc::now(), self.lookback())
    }
}

/// Snapshot copy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Local snapshot file, replaced every cycle.
    pub path: PathBuf,
    pub attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl SnapshotConfig {
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

/// Remote collector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub host: String,
    pub port: u16,
    /// Per-attempt request timeout.
    pub timeout_secs: u64,
    pub attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            timeout_secs: 5,
            attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl SinkConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

/// Optional identity overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub username: Option<String>,
    pub source_ip: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_config_defaults() {
        let config = WatcherConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.lookback(), chrono::Duration::days(7));
        assert_eq!(config.keywords_file, PathBuf::from("keywords.txt"));
        assert!(config.history_path.is_none());
        assert_eq!(config.seen_retention(), 3_600_000_000);
    }

    #[test]
    fn test_retry_defaults() {
        let config = WatcherConfig::default();
        assert_eq!(
            config.snapshot.retry_policy(),
            RetryPolicy::new(3, Duration::from_secs(1))
        );
        assert_eq!(
            config.sink.retry_policy(),
            RetryPolicy::new(2, Duration::from_secs(1))
        );
        assert_eq!(config.sink.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let toml = r#"
            keywords_file = "/etc/history-watcher/keywords.txt"
            poll_interval_secs = 10

            [sink]
            host = "collector.lan"
            port = 8080

            [identity]
            username = "kiosk-3"
        "#;
        let config: WatcherConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.lookback_days, 7);
        assert_eq!(config.sink.host, "collector.lan");
        assert_eq!(config.sink.port, 8080);
        assert_eq!(config.sink.attempts, 2);
        assert_eq!(config.snapshot.attempts, 3);
        assert_eq!(config.identity.username.as_deref(), Some("kiosk-3"));
        assert!(config.identity.source_ip.is_none());
    }

    #[test]
    fn test_initial_watermark_is_in_the_past() {
        let config = WatcherConfig::default();
        assert!(config.initial_watermark() < timestamp::now_ticks());
    }
}
