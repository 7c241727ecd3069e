//! History Watcher - incremental browser history monitoring with keyword
//! matching and remote delivery.

pub mod config;
pub mod delivery;
pub mod display;
pub mod identity;
pub mod retry;
pub mod store;
pub mod tracker;
pub mod watcher;
