//! crates/production_tracker_core/src/lib.rs
//!
//! Domain types, ports and the storage service of the production tracker.
//! Adapters for real storage and the spreadsheet bridge live in the service crate.

pub mod actions;
pub mod analytics;
pub mod clock;
pub mod domain;
pub mod endpoint;
pub mod events;
pub mod memory;
pub mod normalize;
pub mod ports;
pub mod seed;
pub mod service;
pub mod store;
pub mod sync;

pub use actions::{ActionError, ActualRequest, EntryPatch, NewUser, PlanRequest};
pub use domain::{
    ActivityLog, Category, Collection, DashboardStats, OffDay, ProcessType, ProductionEntry,
    Role, Unit, User,
};
pub use events::{DataEvent, EventBus};
pub use ports::{Clock, KeyValueStore, PortError, PortResult, RemoteStore};
pub use service::{ServiceConfig, TrackerService};
pub use sync::{SyncError, SyncReport};
