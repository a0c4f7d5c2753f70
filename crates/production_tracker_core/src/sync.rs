//! crates/production_tracker_core/src/sync.rs
//!
//! Reconciliation: pull the four remote collections and overwrite the local copies.
//!
//! There is no merge. Each collection is handled independently: a collection whose
//! fetch fails or whose payload is malformed keeps its local contents, the others
//! are replaced wholesale by what the remote returned.

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::domain::{ActivityLog, Collection, FetchAction, OffDay, ProductionEntry, User};
use crate::events::{ChangeOrigin, DataEvent};
use crate::normalize::{NormalizedRecord, Normalizer};
use crate::ports::PortError;
use crate::service::TrackerService;

/// The result of reconciling one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CollectionSync {
    /// The remote bridge is disabled.
    Skipped,
    /// The fetch returned nothing; local data kept.
    Unavailable,
    /// The payload had an unusable shape; local data kept.
    Rejected { reason: String },
    /// Local data overwritten with the remote copy.
    Replaced {
        records: usize,
        rejected_rows: usize,
        dropped_rows: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub production: CollectionSync,
    pub off_days: CollectionSync,
    pub logs: CollectionSync,
    pub users: CollectionSync,
}

impl SyncReport {
    fn skipped() -> Self {
        Self {
            production: CollectionSync::Skipped,
            off_days: CollectionSync::Skipped,
            logs: CollectionSync::Skipped,
            users: CollectionSync::Skipped,
        }
    }

    pub fn get(&self, collection: Collection) -> &CollectionSync {
        match collection {
            Collection::Production => &self.production,
            Collection::OffDays => &self.off_days,
            Collection::Logs => &self.logs,
            Collection::Users => &self.users,
        }
    }

    /// Collections that were overwritten.
    pub fn replaced(&self) -> Vec<Collection> {
        Collection::ALL
            .into_iter()
            .filter(|c| matches!(self.get(*c), CollectionSync::Replaced { .. }))
            .collect()
    }
}

/// Reconciliation stops at the first local write that fails. Collections written
/// before the failure stay written.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to store remote {collection:?} locally: {source}")]
    LocalWrite {
        collection: Collection,
        #[source]
        source: PortError,
    },
}

impl TrackerService {
    /// Pulls every remote collection concurrently and overwrites the local copies.
    pub async fn sync_with_remote(&self) -> Result<SyncReport, SyncError> {
        if !self.remote.is_enabled() {
            return Ok(SyncReport::skipped());
        }

        let (production, off_days, logs, users) = futures::join!(
            self.remote.fetch(FetchAction::GetProduction),
            self.remote.fetch(FetchAction::GetOffDays),
            self.remote.fetch(FetchAction::GetLogs),
            self.remote.fetch(FetchAction::GetUsers),
        );

        let normalizer = self.normalizer();
        let result: Result<SyncReport, SyncError> = async {
            Ok(SyncReport {
                production: self.apply::<ProductionEntry>(&normalizer, production).await?,
                off_days: self.apply::<OffDay>(&normalizer, off_days).await?,
                logs: self.apply::<ActivityLog>(&normalizer, logs).await?,
                users: self.apply::<User>(&normalizer, users).await?,
            })
        }
        .await;

        match &result {
            Ok(report) => {
                info!(replaced = ?report.replaced(), "Remote sync finished");
                self.events.publish(DataEvent::SyncFinished {
                    report: report.clone(),
                });
            }
            Err(e) => {
                error!("Critical sync failure: {}", e);
                self.events.publish(DataEvent::SyncFailed {
                    message: e.to_string(),
                });
            }
        }
        result
    }

    async fn apply<T: NormalizedRecord>(
        &self,
        normalizer: &Normalizer,
        payload: Option<Value>,
    ) -> Result<CollectionSync, SyncError> {
        let collection = T::COLLECTION;
        let Some(payload) = payload else {
            warn!(?collection, "Remote fetch returned nothing; keeping local copy");
            return Ok(CollectionSync::Unavailable);
        };
        let normalized = match normalizer.payload::<T>(&payload) {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!(?collection, error = %e, "Remote payload rejected; keeping local copy");
                return Ok(CollectionSync::Rejected {
                    reason: e.to_string(),
                });
            }
        };
        for row in &normalized.rejected {
            warn!(?collection, index = row.index, error = %row.error, "Skipping malformed remote record");
        }

        self.overwrite(&normalized.records)
            .await
            .map_err(|source| SyncError::LocalWrite { collection, source })?;
        self.events.publish(DataEvent::CollectionChanged {
            collection,
            origin: ChangeOrigin::Remote,
        });

        Ok(CollectionSync::Replaced {
            records: normalized.records.len(),
            rejected_rows: normalized.rejected.len(),
            dropped_rows: normalized.dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keys;
    use crate::memory::InMemoryStore;
    use crate::ports::{KeyValueStore, PortResult};
    use crate::service::tests::{entry, service_with, ScriptedRemote};
    use crate::service::ServiceConfig;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn disabled_remote_skips_everything() {
        let service = service_with(
            Arc::new(InMemoryStore::new()),
            Arc::new(ScriptedRemote::default()),
            ServiceConfig::default(),
        );
        let report = service.sync_with_remote().await.unwrap();
        assert!(report.replaced().is_empty());
        assert_eq!(report.users, CollectionSync::Skipped);
    }

    #[tokio::test]
    async fn one_missing_fetch_leaves_that_collection_untouched() {
        let kv = Arc::new(InMemoryStore::new());
        let remote = Arc::new(ScriptedRemote::enabled());
        let service = service_with(kv.clone(), remote.clone(), ServiceConfig {
            mirror: crate::service::MirrorPolicy { await_deletes: true, await_writes: true },
            ..ServiceConfig::default()
        });
        service.save_production_data(vec![entry("local", "2025-06-01")]).await.unwrap();
        let production_before = kv.raw(keys::PRODUCTION).await;

        remote.respond(FetchAction::GetOffDays, json!([{"id": "od9", "date": "2025-08-31"}]));
        remote.respond(
            FetchAction::GetLogs,
            json!([{"id": "l1", "timestamp": "2025-06-14 10:00:00", "action": "ADD_USER"}]),
        );
        remote.respond(
            FetchAction::GetUsers,
            json!([{"id": "u1", "username": "admin", "role": "admin", "password": "pw"}]),
        );

        let report = service.sync_with_remote().await.unwrap();

        assert_eq!(report.production, CollectionSync::Unavailable);
        assert_eq!(kv.raw(keys::PRODUCTION).await, production_before);
        assert_eq!(service.get_off_days().await[0].id, "od9");
        assert_eq!(service.get_logs().await.len(), 1);
        assert_eq!(service.get_users().await[0].username, "admin");
        assert_eq!(
            report.replaced(),
            vec![Collection::OffDays, Collection::Logs, Collection::Users]
        );
    }

    #[tokio::test]
    async fn remote_copy_replaces_local_wholesale() {
        let kv = Arc::new(InMemoryStore::new());
        let remote = Arc::new(ScriptedRemote::enabled());
        let service = service_with(kv, remote.clone(), ServiceConfig::default());
        service
            .save_production_data(vec![entry("a", "2025-06-01"), entry("b", "2025-06-02")])
            .await
            .unwrap();

        remote.respond(
            FetchAction::GetProduction,
            json!([
                ["id", "date", "productName", "planQuantity"],
                ["r1", "2025-06-10 00:00:00", "Charcoal Paste", "320"],
                ["r2", "", "Nameless", 1],
                ["r3", "2025-06-11", "Bad", "n/a"]
            ]),
        );

        let report = service.sync_with_remote().await.unwrap();

        assert_eq!(
            report.production,
            CollectionSync::Replaced { records: 1, rejected_rows: 1, dropped_rows: 1 }
        );
        let entries = service.get_production_data().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "r1");
        assert_eq!(entries[0].date, "2025-06-10");
        assert_eq!(entries[0].plan_quantity, 320.0);
    }

    #[tokio::test]
    async fn unschematized_rows_keep_local_copy() {
        let kv = Arc::new(InMemoryStore::new());
        let remote = Arc::new(ScriptedRemote::enabled());
        let service = service_with(kv, remote.clone(), ServiceConfig::default());
        service.save_off_days(vec![]).await.unwrap();
        service
            .save_production_data(vec![entry("keep", "2025-06-01")])
            .await
            .unwrap();

        remote.respond(
            FetchAction::GetProduction,
            json!([["x", "2025-06-01", "Healthcare", "Mixing", "Gel", 1, 1]]),
        );

        let report = service.sync_with_remote().await.unwrap();

        assert!(matches!(report.production, CollectionSync::Rejected { .. }));
        assert_eq!(service.get_production_data().await[0].id, "keep");
    }

    /// Fails writes to one key.
    struct FailingStore {
        inner: InMemoryStore,
        poisoned: &'static str,
    }

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, key: &str) -> PortResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> PortResult<()> {
            if key == self.poisoned {
                return Err(PortError::Unexpected("disk full".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> PortResult<()> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn local_write_failure_aborts_after_earlier_writes() {
        let kv = Arc::new(FailingStore {
            inner: InMemoryStore::new(),
            poisoned: keys::LOGS,
        });
        let remote = Arc::new(ScriptedRemote::enabled());
        let service = TrackerService::new(
            kv,
            remote.clone(),
            crate::service::tests::clock(),
            ServiceConfig::default(),
        );
        let mut events = service.events().subscribe();

        remote.respond(FetchAction::GetProduction, json!([{"id": "p", "date": "2025-06-01"}]));
        remote.respond(FetchAction::GetLogs, json!([]));

        let err = service.sync_with_remote().await.unwrap_err();

        assert!(matches!(err, SyncError::LocalWrite { collection: Collection::Logs, .. }));
        assert_eq!(service.get_production_data().await.len(), 1);
        assert!(matches!(
            events.recv().await.unwrap(),
            DataEvent::CollectionChanged { collection: Collection::Production, origin: ChangeOrigin::Remote }
        ));
        assert!(matches!(events.recv().await.unwrap(), DataEvent::SyncFailed { .. }));
    }
}
