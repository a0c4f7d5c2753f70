//! crates/production_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the tracker's core logic.
//! Local storage, the remote spreadsheet bridge and the clock are all injected
//! through these traits, so the core never touches a filesystem, a socket or
//! the system time directly.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::domain::{FetchAction, SaveAction};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistent string key-value storage, the equivalent of a browser's local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key has never been written.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> PortResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// The best-effort bridge to the spreadsheet-backed remote store.
///
/// Neither method reports errors: failures are logged by the implementation and
/// surface as `None` / `false`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Whether a plausible endpoint is currently configured.
    fn is_enabled(&self) -> bool;

    /// The endpoint currently in use.
    fn endpoint(&self) -> Option<String>;

    /// Replaces the active endpoint. `None` disables the bridge.
    fn set_endpoint(&self, url: Option<String>);

    /// Fetches the raw JSON payload of a read action.
    async fn fetch(&self, action: FetchAction) -> Option<Value>;

    /// Dispatches a write. `true` means the request went out, not that the
    /// remote end accepted it.
    async fn save(&self, action: SaveAction, payload: Value) -> bool;
}

/// Source of the current site-local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

//=========================================================================================
// Disabled Remote
//=========================================================================================

/// A remote bridge that never has an endpoint. Used when no spreadsheet is linked.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRemote;

#[async_trait]
impl RemoteStore for DisabledRemote {
    fn is_enabled(&self) -> bool {
        false
    }

    fn endpoint(&self) -> Option<String> {
        None
    }

    fn set_endpoint(&self, _url: Option<String>) {}

    async fn fetch(&self, _action: FetchAction) -> Option<Value> {
        None
    }

    async fn save(&self, _action: SaveAction, _payload: Value) -> bool {
        false
    }
}
