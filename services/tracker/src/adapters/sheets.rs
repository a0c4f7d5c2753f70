//! services/tracker/src/adapters/sheets.rs
//!
//! The adapter for the spreadsheet web-app endpoint. It implements the
//! `RemoteStore` port from the `core` crate over plain HTTP with `reqwest`.
//!
//! Reads are `GET {url}?action=..` returning JSON. Writes are `POST {url}` with a
//! `{action, data, timestamp}` body. The endpoint's reply to a write carries no
//! useful information, so a write counts as dispatched once any response arrives.

use async_trait::async_trait;
use chrono::Utc;
use production_tracker_core::domain::{FetchAction, SaveAction};
use production_tracker_core::ports::RemoteStore;
use serde::Serialize;
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct SheetsAdapter {
    client: reqwest::Client,
    endpoint: RwLock<Option<String>>,
}

#[derive(Serialize)]
struct SaveRequest<'a> {
    action: &'a str,
    data: &'a Value,
    timestamp: i64,
}

impl SheetsAdapter {
    /// Creates an adapter with no endpoint; the storage service sets it during `init`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: RwLock::new(None),
        }
    }

    fn current(&self) -> Option<String> {
        match self.endpoint.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

//=========================================================================================
// `RemoteStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RemoteStore for SheetsAdapter {
    fn is_enabled(&self) -> bool {
        self.current().is_some()
    }

    fn endpoint(&self) -> Option<String> {
        self.current()
    }

    fn set_endpoint(&self, url: Option<String>) {
        match self.endpoint.write() {
            Ok(mut guard) => *guard = url,
            Err(poisoned) => *poisoned.into_inner() = url,
        }
    }

    async fn fetch(&self, action: FetchAction) -> Option<Value> {
        let url = self.current()?;
        // Cache busters: the endpoint sits behind caches that ignore headers.
        let seed = Uuid::new_v4().simple().to_string();
        let query = [
            ("action", action.as_str().to_string()),
            ("_t", Utc::now().timestamp_millis().to_string()),
            ("_s", seed[..6].to_string()),
        ];

        let response = match self.client.get(&url).query(&query).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Sheets fetch error ({}): {}", action.as_str(), e);
                return None;
            }
        };
        if !response.status().is_success() {
            error!("Sheets fetch error ({}): HTTP {}", action.as_str(), response.status());
            return None;
        }
        match response.json::<Value>().await {
            Ok(payload) => {
                debug!(action = action.as_str(), "Fetched remote collection");
                Some(payload)
            }
            Err(e) => {
                error!("Sheets fetch error ({}): malformed JSON: {}", action.as_str(), e);
                None
            }
        }
    }

    async fn save(&self, action: SaveAction, payload: Value) -> bool {
        let Some(url) = self.current() else {
            return false;
        };
        let body = SaveRequest {
            action: action.as_str(),
            data: &payload,
            timestamp: Utc::now().timestamp_millis(),
        };

        match self.client.post(&url).json(&body).send().await {
            Ok(response) => {
                if !response.status().is_success() {
                    warn!(
                        action = action.as_str(),
                        status = %response.status(),
                        "Sheets endpoint answered a save with a non-success status"
                    );
                }
                true
            }
            Err(e) => {
                error!("Sheets save error ({}): {}", action.as_str(), e);
                false
            }
        }
    }
}
