//! crates/production_tracker_core/src/events.rs
//!
//! A typed broadcast channel from the data layer to whoever presents the data.
//! Views subscribe once and refresh when a collection they show changes.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::Collection;
use crate::sync::SyncReport;

const DEFAULT_CAPACITY: usize = 256;

/// Where a collection change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataEvent {
    CollectionChanged {
        collection: Collection,
        origin: ChangeOrigin,
    },
    SessionChanged {
        user_id: Option<String>,
    },
    SyncFinished {
        report: SyncReport,
    },
    SyncFailed {
        message: String,
    },
    Notification {
        level: NotificationLevel,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DataEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.sender.subscribe()
    }

    /// Publishing with no subscribers is fine; the event is simply dropped.
    pub fn publish(&self, event: DataEvent) {
        trace!(?event, "Publishing data event");
        let _ = self.sender.send(event);
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.publish(DataEvent::Notification {
            level,
            message: message.into(),
        });
    }
}
