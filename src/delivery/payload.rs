//! Wire format sent to the collector.

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::store::timestamp;
use crate::tracker::PendingMatch;

/// JSON body POSTed for every match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPayload {
    pub username: String,
    #[serde(rename = "source_ip")]
    pub source_identity: String,
    /// Visit time as naive ISO-8601 local time.
    #[serde(rename = "last_visit")]
    pub observed_at: String,
    pub url: String,
    pub title: Option<String>,
    pub matched_keywords: Vec<String>,
}

impl MatchPayload {
    /// Build the payload for a pending match.
    ///
    /// Visit times outside the renderable range are clamped to it.
    #[must_use]
    pub fn from_match(pending: &PendingMatch, identity: &Identity) -> Self {
        let ticks = pending.record.last_visit;
        let clamped = timestamp::clamp_renderable(ticks);
        if clamped != ticks {
            tracing::warn!(
                id = pending.record.id,
                ticks,
                clamped,
                "Visit time out of range, clamping"
            );
        }
        Self {
            username: identity.username.clone(),
            source_identity: identity.source_ip.clone(),
            observed_at: timestamp::format_local_clamped(clamped),
            url: pending.record.url.clone(),
            title: pending.record.title.clone(),
            matched_keywords: pending.keywords.clone(),
        }
    }
}
