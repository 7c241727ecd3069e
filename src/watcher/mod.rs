//! Polling watch loop over the browser history store.

mod error;
mod runner;
mod state;

pub use error::WatchError;
pub use runner::{CycleReport, Watcher};
pub use state::{WatchState, WatchStateMachine, WatchStats};
