//! services/tracker/src/web/state.rs
//!
//! Defines the application state shared by every handler.

use crate::config::Config;
use production_tracker_core::TrackerService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TrackerService>,
    pub config: Arc<Config>,
    /// Cancelled when the server begins shutting down; long-lived connections watch it.
    pub shutdown: CancellationToken,
}
