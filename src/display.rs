//! Colored operator console output.
//!
//! Structured detail goes through `tracing`; these lines are the short,
//! human-facing summary of what the watcher did.

use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use owo_colors::OwoColorize;

use crate::delivery::MatchPayload;
use crate::watcher::{CycleReport, WatchStats};

/// Maximum length for URLs and titles on the console.
const DEFAULT_MAX_LEN: usize = 80;

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Truncate to `max_len` characters, adding an ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Print the startup banner.
pub fn print_watch_start(history: &Path, keywords: &[String], endpoint: &str) {
    println!(
        "{} {} {} keywords=[{}] -> {}",
        timestamp().dimmed(),
        "[WATCH]".blue().bold(),
        history.display().cyan(),
        keywords.join(", "),
        endpoint.dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print a successful delivery.
pub fn print_sent(payload: &MatchPayload) {
    println!(
        "{} {} {} [{}] {}",
        timestamp().dimmed(),
        "[SENT]".green().bold(),
        payload.observed_at,
        payload.matched_keywords.join(", ").cyan(),
        truncate(&payload.url, DEFAULT_MAX_LEN)
    );
    let _ = io::stdout().flush();
}

/// Print a delivery that exhausted its retries.
pub fn print_failed(payload: &MatchPayload, reason: &str) {
    println!(
        "{} {} {} [{}] {} - {}",
        timestamp().dimmed(),
        "[FAILED]".red().bold(),
        payload.observed_at,
        payload.matched_keywords.join(", ").cyan(),
        truncate(&payload.url, DEFAULT_MAX_LEN),
        reason.dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print a delivery abandoned because the watcher is stopping.
pub fn print_interrupted(payload: &MatchPayload) {
    println!(
        "{} {} {} [{}] {}",
        timestamp().dimmed(),
        "[ABORTED]".yellow().bold(),
        payload.observed_at,
        payload.matched_keywords.join(", ").cyan(),
        truncate(&payload.url, DEFAULT_MAX_LEN)
    );
    let _ = io::stdout().flush();
}

/// Print a skipped cycle.
pub fn print_skipped(reason: &str) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[SKIP]".yellow().bold(),
        truncate(reason, 200)
    );
    let _ = io::stdout().flush();
}

/// Print a single-cycle report.
pub fn print_cycle_report(report: &CycleReport) {
    println!(
        "{} {} examined={} matched={} delivered={} failed={} watermark={}",
        timestamp().dimmed(),
        "[CYCLE]".blue().bold(),
        report.examined,
        report.matched,
        report.delivered,
        report.failed,
        report.watermark_after
    );
    let _ = io::stdout().flush();
}

/// Print the final counters on shutdown.
pub fn print_stopped(stats: &WatchStats) {
    println!(
        "{} {} cycles={} skipped={} delivered={} failed={} interrupted={}",
        timestamp().dimmed(),
        "[STOPPED]".magenta().bold(),
        stats.cycles,
        stats.skipped_cycles,
        stats.delivered,
        stats.failed,
        stats.interrupted
    );
    let _ = io::stdout().flush();
}
