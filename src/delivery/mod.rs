//! Delivery of matches to the remote collector.

mod client;
mod error;
mod payload;

pub use client::{DeliverySink, HttpSink, DEFAULT_REQUEST_TIMEOUT};
pub use error::DeliveryError;
pub use payload::MatchPayload;
