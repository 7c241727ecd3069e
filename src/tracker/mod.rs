//! Keyword matching, re-delivery suppression and watermark progression.

mod keywords;
mod seen;
mod watermark;

pub use keywords::KeywordSet;
pub use seen::SeenSet;
pub use watermark::{Advance, PendingMatch, Scan, Tracker};
