//! Configuration file and keyword file loading.

use std::path::{Path, PathBuf};

use super::types::WatcherConfig;
use crate::store;
use crate::tracker::KeywordSet;

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from(".history-watcher.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("history-watcher").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<WatcherConfig, ConfigError> {
        if let Some(path) = self.find_config_file() {
            tracing::debug!(path = %path.display(), "Loading config file");
            return Self::load_from_path(&path);
        }

        tracing::debug!("No config file found, using defaults");
        Ok(WatcherConfig::default())
    }

    fn load_from_path(path: &Path) -> Result<WatcherConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load the keyword file: one term per line, blank lines ignored.
///
/// # Errors
///
/// Returns `ConfigError::KeywordsRead` if the file cannot be read and
/// `ConfigError::EmptyKeywords` if it holds no terms.
pub fn load_keywords(path: &Path) -> Result<KeywordSet, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordsRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let keywords = KeywordSet::from_lines(content.lines());
    if keywords.is_empty() {
        return Err(ConfigError::EmptyKeywords(path.to_path_buf()));
    }
    Ok(keywords)
}

/// Pick the history store: the configured path if set, else the first
/// discovered candidate.
///
/// # Errors
///
/// Returns `ConfigError::StoreNotFound` when no usable file exists.
pub fn resolve_history_path(config: &WatcherConfig) -> Result<PathBuf, ConfigError> {
    if let Some(path) = &config.history_path {
        return if path.is_file() {
            Ok(path.clone())
        } else {
            Err(ConfigError::StoreNotFound(vec![path.clone()]))
        };
    }

    store::find_history_path()
        .ok_or_else(|| ConfigError::StoreNotFound(store::candidate_history_paths()))
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read keyword file {path}: {source}")]
    KeywordsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No keywords in {0}")]
    EmptyKeywords(PathBuf),

    #[error("Browser history not found (checked {} location(s))", .0.len())]
    StoreNotFound(Vec<PathBuf>),
}
