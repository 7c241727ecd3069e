//! Locating the browser's `History` file on disk.

use std::path::{Path, PathBuf};

/// Candidate `History` paths for the current platform, in priority order.
#[must_use]
pub fn candidate_history_paths() -> Vec<PathBuf> {
    candidates_for(
        std::env::consts::OS,
        dirs::home_dir().as_deref(),
        dirs::data_local_dir().as_deref(),
    )
}

/// First candidate that exists on disk.
#[must_use]
pub fn find_history_path() -> Option<PathBuf> {
    first_existing(candidate_history_paths())
}

fn first_existing(candidates: Vec<PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|p| p.is_file())
}

fn candidates_for(os: &str, home: Option<&Path>, local_data: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    match os {
        "windows" => {
            if let Some(local) = local_data {
                for vendor in [
                    &["Google", "Chrome"][..],
                    &["Chromium"][..],
                    &["Microsoft", "Edge"][..],
                ] {
                    let mut p = local.to_path_buf();
                    p.extend(vendor);
                    paths.push(p.join("User Data").join("Default").join("History"));
                }
            }
        }
        "macos" => {
            if let Some(home) = home {
                let support = home.join("Library").join("Application Support");
                paths.push(support.join("Google").join("Chrome").join("Default").join("History"));
                paths.push(support.join("Chromium").join("Default").join("History"));
            }
        }
        _ => {
            if let Some(home) = home {
                let config = home.join(".config");
                for browser in ["google-chrome", "chromium", "brave"] {
                    paths.push(config.join(browser).join("Default").join("History"));
                }
            }
        }
    }
    paths
}
