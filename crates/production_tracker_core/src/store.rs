//! crates/production_tracker_core/src/store.rs
//!
//! Typed access to the collections kept in a `KeyValueStore`.
//!
//! Reads never fail. A missing key, a storage error or a blob that does not parse
//! all read as an empty collection, so callers always have something to work with.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{keys, User};
use crate::normalize::{NormalizedRecord, Normalizer};
use crate::ports::{KeyValueStore, PortError, PortResult};

#[derive(Clone)]
pub struct LocalStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Whether a collection has ever been written.
    pub async fn contains<T: NormalizedRecord>(&self) -> PortResult<bool> {
        Ok(self.kv.get(T::COLLECTION.storage_key()).await?.is_some())
    }

    /// Reads and normalizes a collection.
    pub async fn read<T: NormalizedRecord>(&self, normalizer: &Normalizer) -> Vec<T> {
        let key = T::COLLECTION.storage_key();
        let Some(value) = self.read_json(key).await else {
            return Vec::new();
        };
        match normalizer.payload::<T>(&value) {
            Ok(normalized) => {
                for row in &normalized.rejected {
                    warn!(key, index = row.index, error = %row.error, "Skipping unreadable stored record");
                }
                normalized.records
            }
            Err(e) => {
                warn!(key, error = %e, "Stored collection has an unexpected shape; treating it as empty");
                Vec::new()
            }
        }
    }

    /// Serializes a collection and writes it under its key.
    pub async fn write<T: NormalizedRecord>(&self, records: &[T]) -> PortResult<()> {
        let key = T::COLLECTION.storage_key();
        let blob = serde_json::to_string(records)
            .map_err(|e| PortError::Unexpected(format!("Failed to serialize {key}: {e}")))?;
        self.kv.set(key, blob).await?;
        debug!(key, count = records.len(), "Collection written");
        Ok(())
    }

    /// The cached logged-in user, if any.
    pub async fn session(&self) -> Option<User> {
        let value = self.read_json(keys::SESSION).await?;
        match serde_json::from_value::<User>(value) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Stored session is unreadable; ignoring it");
                None
            }
        }
    }

    pub async fn set_session(&self, user: Option<&User>) -> PortResult<()> {
        match user {
            Some(user) => {
                let blob = serde_json::to_string(user)
                    .map_err(|e| PortError::Unexpected(format!("Failed to serialize session: {e}")))?;
                self.kv.set(keys::SESSION, blob).await
            }
            None => self.kv.remove(keys::SESSION).await,
        }
    }

    /// The id handed to the client that opened the current session.
    pub async fn session_token(&self) -> Option<String> {
        match self.kv.get(keys::SESSION_TOKEN).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read session token");
                None
            }
        }
    }

    pub async fn set_session_token(&self, token: Option<&str>) -> PortResult<()> {
        match token {
            Some(token) => self.kv.set(keys::SESSION_TOKEN, token.to_string()).await,
            None => self.kv.remove(keys::SESSION_TOKEN).await,
        }
    }

    /// The remote URL saved by an administrator, if any.
    pub async fn saved_remote_url(&self) -> Option<String> {
        match self.kv.get(keys::REMOTE_URL).await {
            Ok(url) => url.filter(|u| !u.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read saved remote URL");
                None
            }
        }
    }

    pub async fn set_saved_remote_url(&self, url: Option<&str>) -> PortResult<()> {
        match url {
            Some(url) => self.kv.set(keys::REMOTE_URL, url.to_string()).await,
            None => self.kv.remove(keys::REMOTE_URL).await,
        }
    }

    async fn read_json(&self, key: &str) -> Option<Value> {
        let raw = match self.kv.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read from local storage");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Corrupt blob in local storage");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityLog, OffDay, ProductionEntry, Role, Unit};
    use crate::memory::InMemoryStore;

    fn normalizer() -> Normalizer {
        Normalizer::new("2025-01-01 00:00:00")
    }

    #[tokio::test]
    async fn corrupt_and_missing_blobs_read_as_empty() {
        let kv = Arc::new(InMemoryStore::with_entries([
            (keys::PRODUCTION, "{not json"),
            (keys::OFF_DAYS, "{\"rows\": 3}"),
            (keys::SESSION, "[1, 2]"),
        ]));
        let store = LocalStore::new(kv);

        assert!(store.read::<ProductionEntry>(&normalizer()).await.is_empty());
        assert!(store.read::<OffDay>(&normalizer()).await.is_empty());
        assert!(store.read::<ActivityLog>(&normalizer()).await.is_empty());
        assert!(store.session().await.is_none());
    }

    #[tokio::test]
    async fn stored_records_are_normalized_on_read() {
        let kv = Arc::new(InMemoryStore::with_entries([(
            keys::PRODUCTION,
            r#"[{"id":"1","date":"2025-05-05 08:00:00","productName":"Gel"},{"id":"2"}]"#,
        )]));
        let store = LocalStore::new(kv);

        let entries = store.read::<ProductionEntry>(&normalizer()).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, "2025-05-05");
        assert_eq!(entries[0].unit, Unit::Kg);
    }

    #[tokio::test]
    async fn session_round_trips_and_clears() {
        let kv = Arc::new(InMemoryStore::new());
        let store = LocalStore::new(kv.clone());
        let user = User {
            id: "u9".to_string(),
            name: "Night Shift".to_string(),
            username: "night".to_string(),
            email: String::new(),
            role: Role::Operator,
            category: None,
            password: Some("secret1".to_string()),
            avatar: None,
        };

        store.set_session(Some(&user)).await.unwrap();
        assert_eq!(store.session().await, Some(user));

        store.set_session(None).await.unwrap();
        assert!(store.session().await.is_none());
        assert!(kv.raw(keys::SESSION).await.is_none());
    }
}
