//! services/tracker/src/error.rs
//!
//! Defines the primary error type for the tracker service binary.

use crate::config::ConfigError;
use production_tracker_core::ports::PortError;

/// The primary error type for the `tracker` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Failure building the HTTP client for the remote bridge.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Binding the listener or preparing the data directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
