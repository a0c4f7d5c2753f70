//! services/tracker/src/lib.rs
//!
//! The tracker HTTP service: storage and spreadsheet adapters, the REST and
//! WebSocket surface, and the periodic sync worker.

pub mod adapters;
pub mod config;
pub mod error;
pub mod sync_task;
pub mod web;
