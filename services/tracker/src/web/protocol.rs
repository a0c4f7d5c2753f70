//! services/tracker/src/web/protocol.rs
//!
//! Messages pushed to clients over the `/events` WebSocket.

use production_tracker_core::DataEvent;
use serde::Serialize;

/// The structured text messages the server sends. Clients never send anything
/// meaningful; incoming frames other than `Close` are ignored.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the upgrade.
    Connected { user_id: String },

    /// A data-layer event, forwarded as is.
    Event { event: DataEvent },

    /// The client fell behind and `skipped` events were dropped. It should
    /// refetch everything it shows.
    Lagged { skipped: u64 },
}
