//! Delivery error types.

/// Errors from delivering a match to the collector.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The configured collector host cannot form a URL.
    #[error("Invalid collector host {0:?}")]
    InvalidHost(String),

    /// Connection, timeout or other transport failure.
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The collector answered with something other than 200.
    #[error("Collector rejected payload with HTTP {0}")]
    Rejected(u16),

    /// Every attempt failed.
    #[error("Delivery failed after {attempts} attempt(s): {source}")]
    Failed {
        attempts: u32,
        #[source]
        source: Box<DeliveryError>,
    },

    /// Shutdown cut the retry budget short.
    #[error("Delivery interrupted by shutdown after {attempts} attempt(s): {source}")]
    Interrupted {
        attempts: u32,
        #[source]
        source: Box<DeliveryError>,
    },
}

impl DeliveryError {
    /// Whether the failure came from shutdown rather than the collector.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}
