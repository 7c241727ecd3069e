//! WebKit timestamp codec.
//!
//! Chromium stores visit times as microseconds since 1601-01-01T00:00:00Z.
//! Stored values are UTC; anything shown to an operator or sent to the
//! collector is rendered in local time.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike, Utc};

/// Store-native time unit: microseconds since the WebKit epoch.
pub type Ticks = i64;

/// Microseconds between 1601-01-01 and 1970-01-01.
pub const WEBKIT_EPOCH_OFFSET_MICROS: i64 = 11_644_473_600_000_000;

const MICROS_PER_SEC: i64 = 1_000_000;

/// 9999-12-30T23:59:59Z, the latest tick rendered with a four-digit year in every zone.
pub const MAX_RENDERED_TICKS: Ticks = 265_046_687_999_000_000;

/// Convert a wall-clock time in any zone to ticks.
#[must_use]
pub fn ticks_from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Ticks {
    dt.timestamp_micros().saturating_add(WEBKIT_EPOCH_OFFSET_MICROS)
}

/// Convert ticks back to a UTC time.
///
/// Returns `None` when the value is outside chrono's representable range.
#[must_use]
pub fn datetime_from_ticks(ticks: Ticks) -> Option<DateTime<Utc>> {
    let unix_micros = ticks.checked_sub(WEBKIT_EPOCH_OFFSET_MICROS)?;
    let secs = unix_micros.div_euclid(MICROS_PER_SEC);
    let micros = u32::try_from(unix_micros.rem_euclid(MICROS_PER_SEC)).ok()?;
    DateTime::from_timestamp(secs, micros * 1_000)
}

/// Current time in ticks.
#[must_use]
pub fn now_ticks() -> Ticks {
    ticks_from_datetime(&Utc::now())
}

/// Ticks for `now - lookback`, the starting watermark of a fresh watcher.
#[must_use]
pub fn lookback_start(now: DateTime<Utc>, lookback: chrono::Duration) -> Ticks {
    let start = now.checked_sub_signed(lookback).unwrap_or(now);
    ticks_from_datetime(&start)
}

/// Render ticks as a naive ISO-8601 local time, e.g. `2025-09-29T14:25:10.123456`.
#[must_use]
pub fn format_local(ticks: Ticks) -> Option<String> {
    datetime_from_ticks(ticks).map(|dt| format_naive(&dt.with_timezone(&Local).naive_local()))
}

/// Clamp `ticks` into `0..=MAX_RENDERED_TICKS`.
#[must_use]
pub fn clamp_renderable(ticks: Ticks) -> Ticks {
    ticks.clamp(0, MAX_RENDERED_TICKS)
}

/// Like [`format_local`], but out-of-range values are clamped first so the
/// result is always a well-formed timestamp.
#[must_use]
pub fn format_local_clamped(ticks: Ticks) -> String {
    format_local(clamp_renderable(ticks))
        .unwrap_or_else(|| format_naive(&NaiveDateTime::default()))
}

/// ISO-8601 without offset; the fractional part is omitted when it is zero.
#[must_use]
pub fn format_naive(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
