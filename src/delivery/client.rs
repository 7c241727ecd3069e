//! HTTP delivery client.

use std::net::Ipv6Addr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;

use super::error::DeliveryError;
use super::payload::MatchPayload;
use crate::retry::RetryPolicy;

/// Per-attempt request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Destination for matched records.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Deliver one payload. Implementations own their retry budget.
    async fn deliver(&self, payload: &MatchPayload) -> Result<(), DeliveryError>;
}

/// POSTs payloads as JSON to `http://{host}:{port}/`.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
    cancel: Option<CancellationToken>,
}

impl HttpSink {
    /// Create a sink for the collector at `host:port`.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::InvalidHost` if `host` is neither a name, an
    /// IPv4 address nor an IPv6 address, and `DeliveryError::Client` if the
    /// HTTP client cannot be built.
    pub fn new(
        host: &str,
        port: u16,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, DeliveryError> {
        let endpoint = endpoint_url(host, port)?;
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(DeliveryError::Client)?;
        Ok(Self {
            client,
            endpoint,
            retry,
            cancel: None,
        })
    }

    /// Stop retrying early once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(&self, payload: &MatchPayload) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(DeliveryError::Rejected(status.as_u16())),
        }
    }
}

#[async_trait]
impl DeliverySink for HttpSink {
    async fn deliver(&self, payload: &MatchPayload) -> Result<(), DeliveryError> {
        self.retry
            .run(self.cancel.as_ref(), |attempt| async move {
                tracing::trace!(attempt, endpoint = %self.endpoint, url = %payload.url, "Posting match");
                self.send_once(payload).await
            })
            .await
            .map_err(|exhausted| {
                let interrupted = exhausted.attempts < self.retry.max_attempts()
                    && self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled);
                let source = Box::new(exhausted.last);
                if interrupted {
                    DeliveryError::Interrupted {
                        attempts: exhausted.attempts,
                        source,
                    }
                } else {
                    DeliveryError::Failed {
                        attempts: exhausted.attempts,
                        source,
                    }
                }
            })
    }
}

fn endpoint_url(host: &str, port: u16) -> Result<String, DeliveryError> {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if bare.parse::<Ipv6Addr>().is_ok() {
        return Ok(format!("http://[{bare}]:{port}/"));
    }
    if host.is_empty() || host.contains([':', '/', '[', ']']) {
        return Err(DeliveryError::InvalidHost(host.to_string()));
    }
    Ok(format!("http://{host}:{port}/"))
}
