//! crates/production_tracker_core/src/service.rs
//!
//! The storage service: local persistence with a best-effort remote mirror.
//!
//! Every write lands in local storage first. The full collection is then mirrored
//! to the remote bridge, either awaited or in the background depending on the
//! `MirrorPolicy`. Background mirrors are tracked so `shutdown` can wait for them.
//!
//! Writers of one collection are serialized from the read through the local
//! write, so concurrent read-modify-write cycles cannot drop each other's
//! changes. The guard is released before the mirror goes out.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::clock::db_timestamp;
use crate::domain::{
    ActivityLog, Collection, NewActivityLog, OffDay, ProductionEntry, SaveAction, User,
};
use crate::endpoint::EndpointPolicy;
use crate::events::{ChangeOrigin, DataEvent, EventBus, NotificationLevel};
use crate::normalize::{NormalizedRecord, Normalizer};
use crate::ports::{Clock, KeyValueStore, PortError, PortResult, RemoteStore};
use crate::seed;
use crate::store::LocalStore;

/// Maximum number of activity log entries kept.
pub const DEFAULT_LOG_CAPACITY: usize = 500;

//=========================================================================================
// Configuration
//=========================================================================================

/// Which remote mirrors are awaited before a write returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorPolicy {
    pub await_deletes: bool,
    pub await_writes: bool,
}

impl Default for MirrorPolicy {
    fn default() -> Self {
        Self {
            await_deletes: true,
            await_writes: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub mirror: MirrorPolicy,
    pub endpoint: EndpointPolicy,
    /// The URL shipped with the deployment; a saved URL overrides it.
    pub configured_remote_url: Option<String>,
    pub seed_demo_data: bool,
    pub log_capacity: usize,
    /// How long `shutdown` waits for background mirrors.
    pub shutdown_grace: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            mirror: MirrorPolicy::default(),
            endpoint: EndpointPolicy::default(),
            configured_remote_url: None,
            seed_demo_data: false,
            log_capacity: DEFAULT_LOG_CAPACITY,
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

//=========================================================================================
// Outcomes
//=========================================================================================

/// What happened to the remote copy of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MirrorStatus {
    /// No remote endpoint is configured.
    Disabled,
    /// Nothing was written, so nothing was mirrored.
    Skipped,
    /// Handed to a background task; the outcome is not observed.
    Dispatched,
    /// Awaited and the request went out.
    Delivered,
    /// Awaited and dispatch failed.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SaveOutcome {
    pub stored: usize,
    pub mirror: MirrorStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeleteOutcome {
    pub remaining: Vec<ProductionEntry>,
    pub deleted: Option<ProductionEntry>,
    pub mirror: MirrorStatus,
}

//=========================================================================================
// The Service
//=========================================================================================

/// One writer per collection at a time.
#[derive(Default)]
struct WriteLocks {
    users: Mutex<()>,
    production: Mutex<()>,
    off_days: Mutex<()>,
    logs: Mutex<()>,
}

impl WriteLocks {
    async fn acquire(&self, collection: Collection) -> MutexGuard<'_, ()> {
        let lock = match collection {
            Collection::Users => &self.users,
            Collection::Production => &self.production,
            Collection::OffDays => &self.off_days,
            Collection::Logs => &self.logs,
        };
        lock.lock().await
    }
}

pub struct TrackerService {
    pub(crate) local: LocalStore,
    pub(crate) remote: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    pub(crate) events: EventBus,
    config: ServiceConfig,
    mirrors: TaskTracker,
    locks: WriteLocks,
}

impl TrackerService {
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            local: LocalStore::new(kv),
            remote,
            clock,
            events: EventBus::default(),
            config,
            mirrors: TaskTracker::new(),
            locks: WriteLocks::default(),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn normalizer(&self) -> Normalizer {
        Normalizer::new(db_timestamp(self.clock.as_ref()))
    }

    //-------------------------------------------------------------------------------------
    // Lifecycle
    //-------------------------------------------------------------------------------------

    /// Seeds collections that have never been written and points the remote
    /// bridge at the saved or configured endpoint.
    pub async fn init(&self) -> PortResult<()> {
        if !self.local.contains::<User>().await? {
            info!("Seeding initial users");
            self.local.write(&seed::initial_users()).await?;
        }
        if !self.local.contains::<OffDay>().await? {
            self.local.write(&seed::initial_off_days()).await?;
        }
        if !self.local.contains::<ProductionEntry>().await? {
            let entries = if self.config.seed_demo_data {
                seed::demo_production(self.clock.as_ref())
            } else {
                Vec::new()
            };
            info!(count = entries.len(), "Seeding production data");
            self.local.write(&entries).await?;
        }
        if !self.local.contains::<ActivityLog>().await? {
            self.local.write::<ActivityLog>(&[]).await?;
        }

        let saved = self.local.saved_remote_url().await;
        let resolved = self
            .config
            .endpoint
            .resolve(saved.as_deref(), self.config.configured_remote_url.as_deref());
        match &resolved {
            Some(url) => info!(%url, "Remote mirror enabled"),
            None => info!("No remote endpoint configured; running local-only"),
        }
        self.remote.set_endpoint(resolved);
        Ok(())
    }

    /// Stops spawning background mirrors and waits for the ones in flight.
    pub async fn shutdown(&self) {
        self.mirrors.close();
        let grace = self.config.shutdown_grace;
        if tokio::time::timeout(grace, self.mirrors.wait()).await.is_err() {
            warn!(
                pending = self.mirrors.len(),
                "Remote mirrors still in flight after {:?}; abandoning them", grace
            );
        } else {
            info!("Storage service shut down cleanly");
        }
    }

    //-------------------------------------------------------------------------------------
    // Collections
    //-------------------------------------------------------------------------------------

    pub async fn get_users(&self) -> Vec<User> {
        self.local.read(&self.normalizer()).await
    }

    pub async fn save_users(&self, users: Vec<User>) -> PortResult<SaveOutcome> {
        self.store(users, self.config.mirror.await_writes).await
    }

    pub async fn get_production_data(&self) -> Vec<ProductionEntry> {
        self.local.read(&self.normalizer()).await
    }

    pub async fn save_production_data(
        &self,
        entries: Vec<ProductionEntry>,
    ) -> PortResult<SaveOutcome> {
        self.store(entries, self.config.mirror.await_writes).await
    }

    /// Removes an entry locally and mirrors the result, awaiting the mirror when
    /// the policy says deletes are confirmed. Unknown ids write nothing.
    pub async fn delete_production_entry(&self, id: &str) -> PortResult<DeleteOutcome> {
        let guard = self.locks.acquire(Collection::Production).await;
        let mut remaining = self.get_production_data().await;
        let Some(position) = remaining.iter().position(|entry| entry.id == id) else {
            debug!(id, "Delete requested for unknown production entry");
            return Ok(DeleteOutcome {
                remaining,
                deleted: None,
                mirror: MirrorStatus::Skipped,
            });
        };
        let deleted = remaining.remove(position);
        let (_, payload) = self.commit(remaining.clone()).await?;
        drop(guard);

        let mirror = self
            .mirror(
                Collection::Production.save_action(),
                payload,
                self.config.mirror.await_deletes,
            )
            .await;
        Ok(DeleteOutcome {
            remaining,
            deleted: Some(deleted),
            mirror,
        })
    }

    pub async fn get_off_days(&self) -> Vec<OffDay> {
        self.local.read(&self.normalizer()).await
    }

    pub async fn save_off_days(&self, days: Vec<OffDay>) -> PortResult<SaveOutcome> {
        self.store(days, self.config.mirror.await_writes).await
    }

    /// Newest first.
    pub async fn get_logs(&self) -> Vec<ActivityLog> {
        self.local.read(&self.normalizer()).await
    }

    /// Prepends a log entry, evicting the oldest beyond the capacity.
    pub async fn add_log(&self, entry: NewActivityLog) -> PortResult<ActivityLog> {
        let log = ActivityLog {
            id: Uuid::new_v4().to_string(),
            timestamp: db_timestamp(self.clock.as_ref()),
            user_id: entry.user_id,
            user_name: entry.user_name,
            action: entry.action.as_str().to_string(),
            details: entry.details,
        };
        let capacity = self.config.log_capacity;
        self.update(|logs: &mut Vec<ActivityLog>| -> PortResult<()> {
            logs.insert(0, log.clone());
            logs.truncate(capacity);
            Ok(())
        })
        .await?;
        Ok(log)
    }

    //-------------------------------------------------------------------------------------
    // Session
    //-------------------------------------------------------------------------------------

    pub async fn get_session(&self) -> Option<User> {
        self.local.session().await
    }

    /// Clearing the session also revokes its token.
    pub async fn set_session(&self, user: Option<&User>) -> PortResult<()> {
        if user.is_none() {
            self.local.set_session_token(None).await?;
        }
        self.local.set_session(user).await?;
        self.events.publish(DataEvent::SessionChanged {
            user_id: user.map(|u| u.id.clone()),
        });
        Ok(())
    }

    /// Issues a fresh token for the session, revoking the previous one.
    pub async fn open_session(&self) -> PortResult<String> {
        let token = Uuid::new_v4().to_string();
        self.local.set_session_token(Some(&token)).await?;
        Ok(token)
    }

    /// The session user, if `token` is the one issued for the current session.
    pub async fn session_for(&self, token: &str) -> Option<User> {
        if self.local.session_token().await.as_deref() != Some(token) {
            return None;
        }
        self.get_session().await
    }

    //-------------------------------------------------------------------------------------
    // Remote endpoint
    //-------------------------------------------------------------------------------------

    pub fn is_remote_enabled(&self) -> bool {
        self.remote.is_enabled()
    }

    pub fn remote_url(&self) -> Option<String> {
        self.remote.endpoint()
    }

    /// Saves a user-entered endpoint and re-resolves the active one. Returns the
    /// endpoint now in use, which is `None` if neither candidate is plausible.
    pub async fn set_remote_url(&self, url: Option<&str>) -> PortResult<Option<String>> {
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        self.local.set_saved_remote_url(url).await?;
        let resolved = self
            .config
            .endpoint
            .resolve(url, self.config.configured_remote_url.as_deref());
        self.remote.set_endpoint(resolved.clone());
        info!(enabled = resolved.is_some(), "Remote endpoint updated");
        self.events
            .notify(NotificationLevel::Success, "DATABASE CONFIGURATION UPDATED");
        Ok(resolved)
    }

    //-------------------------------------------------------------------------------------
    // Internals
    //-------------------------------------------------------------------------------------

    /// Holds the collection's write guard while `T` is read and the closure
    /// changes it. Nothing is written when the closure fails. The change is
    /// mirrored after the guard is released.
    pub(crate) async fn update<T, R, E, F>(&self, change: F) -> Result<(R, SaveOutcome), E>
    where
        T: NormalizedRecord,
        R: Send,
        E: From<PortError> + Send,
        F: FnOnce(&mut Vec<T>) -> Result<R, E> + Send,
    {
        let guard = self.locks.acquire(T::COLLECTION).await;
        let mut records = self.local.read::<T>(&self.normalizer()).await;
        let value = change(&mut records)?;
        let (stored, payload) = self.commit(records).await?;
        drop(guard);

        let mirror = self
            .mirror(
                T::COLLECTION.save_action(),
                payload,
                self.config.mirror.await_writes,
            )
            .await;
        Ok((value, SaveOutcome { stored, mirror }))
    }

    /// Holds the collection's write guard while `T` is overwritten with the
    /// records of a remote pull.
    pub(crate) async fn overwrite<T: NormalizedRecord>(&self, records: &[T]) -> PortResult<()> {
        let _guard = self.locks.acquire(T::COLLECTION).await;
        self.local.write(records).await
    }

    /// Replaces a collection wholesale and mirrors it.
    async fn store<T: NormalizedRecord>(
        &self,
        records: Vec<T>,
        await_mirror: bool,
    ) -> PortResult<SaveOutcome> {
        let guard = self.locks.acquire(T::COLLECTION).await;
        let (stored, payload) = self.commit(records).await?;
        drop(guard);

        let mirror = self
            .mirror(T::COLLECTION.save_action(), payload, await_mirror)
            .await;
        Ok(SaveOutcome { stored, mirror })
    }

    /// Normalizes, writes locally and announces the change. Returns the stored
    /// count and the payload to mirror. Callers hold the collection's write guard.
    async fn commit<T: NormalizedRecord>(&self, records: Vec<T>) -> PortResult<(usize, Value)> {
        let collection = T::COLLECTION;
        let payload = serde_json::to_value(&records)
            .map_err(|e| PortError::Unexpected(format!("Failed to serialize {collection:?}: {e}")))?;
        let normalized = self
            .normalizer()
            .payload::<T>(&payload)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        for row in &normalized.rejected {
            warn!(?collection, index = row.index, error = %row.error, "Dropping invalid record before save");
        }
        let cleaned = normalized.records;

        self.local.write(&cleaned).await?;
        self.events.publish(DataEvent::CollectionChanged {
            collection,
            origin: ChangeOrigin::Local,
        });

        let payload = serde_json::to_value(&cleaned)
            .map_err(|e| PortError::Unexpected(format!("Failed to serialize {collection:?}: {e}")))?;
        Ok((cleaned.len(), payload))
    }

    async fn mirror(&self, action: SaveAction, payload: Value, await_mirror: bool) -> MirrorStatus {
        if !self.remote.is_enabled() {
            return MirrorStatus::Disabled;
        }
        // Once shutdown has begun nothing new is spawned; the write is made inline.
        if await_mirror || self.mirrors.is_closed() {
            return if self.remote.save(action, payload).await {
                MirrorStatus::Delivered
            } else {
                MirrorStatus::Failed
            };
        }
        let remote = Arc::clone(&self.remote);
        self.mirrors.spawn(async move {
            if !remote.save(action, payload).await {
                warn!(action = action.as_str(), "Background mirror failed to dispatch");
            }
        });
        MirrorStatus::Dispatched
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::{keys, Category, FetchAction, LogAction, ProcessType, Unit};
    use crate::memory::InMemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A remote bridge with canned fetch responses that records every save.
    #[derive(Default)]
    pub(crate) struct ScriptedRemote {
        pub endpoint: Mutex<Option<String>>,
        pub responses: Mutex<HashMap<&'static str, Value>>,
        pub saves: Mutex<Vec<(SaveAction, Value)>>,
        pub save_result: Mutex<bool>,
    }

    impl ScriptedRemote {
        pub(crate) fn enabled() -> Self {
            let remote = Self::default();
            *remote.endpoint.lock().unwrap() = Some("https://script.google.com/test".to_string());
            *remote.save_result.lock().unwrap() = true;
            remote
        }

        pub(crate) fn respond(&self, action: FetchAction, payload: Value) {
            self.responses.lock().unwrap().insert(action.as_str(), payload);
        }

        pub(crate) fn saved_actions(&self) -> Vec<SaveAction> {
            self.saves.lock().unwrap().iter().map(|(a, _)| *a).collect()
        }
    }

    #[async_trait]
    impl RemoteStore for ScriptedRemote {
        fn is_enabled(&self) -> bool {
            self.endpoint.lock().unwrap().is_some()
        }

        fn endpoint(&self) -> Option<String> {
            self.endpoint.lock().unwrap().clone()
        }

        fn set_endpoint(&self, url: Option<String>) {
            *self.endpoint.lock().unwrap() = url;
        }

        async fn fetch(&self, action: FetchAction) -> Option<Value> {
            self.responses.lock().unwrap().get(action.as_str()).cloned()
        }

        async fn save(&self, action: SaveAction, payload: Value) -> bool {
            self.saves.lock().unwrap().push((action, payload));
            *self.save_result.lock().unwrap()
        }
    }

    pub(crate) fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::at("2025-06-15 09:30:00").unwrap())
    }

    pub(crate) fn service_with(
        kv: Arc<InMemoryStore>,
        remote: Arc<ScriptedRemote>,
        config: ServiceConfig,
    ) -> TrackerService {
        TrackerService::new(kv, remote, clock(), config)
    }

    pub(crate) fn entry(id: &str, date: &str) -> ProductionEntry {
        ProductionEntry {
            id: id.to_string(),
            date: date.to_string(),
            category: Category::Healthcare,
            process: ProcessType::Mixing,
            product_name: "PAIN RELIEF GEL".to_string(),
            plan_quantity: 600.0,
            actual_quantity: 0.0,
            unit: Unit::Kg,
            batch_no: String::new(),
            manpower: 0.0,
            remark: String::new(),
            last_updated_by: "u1".to_string(),
            updated_at: "2025-06-15 09:00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn saved_entry_reads_back_normalized() {
        let kv = Arc::new(InMemoryStore::new());
        let service = service_with(kv, Arc::new(ScriptedRemote::default()), ServiceConfig::default());
        let entry_a = entry("a", "2025-06-15 07:00:00");

        let outcome = service.save_production_data(vec![entry_a.clone()]).await.unwrap();
        assert_eq!(outcome, SaveOutcome { stored: 1, mirror: MirrorStatus::Disabled });

        let stored = service.get_production_data().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].date, "2025-06-15");
        assert_eq!(stored[0].unit, Unit::Kg);
        assert_eq!(stored[0].product_name, entry_a.product_name);
    }

    #[tokio::test]
    async fn delete_removes_known_entry_and_awaits_mirror() {
        let kv = Arc::new(InMemoryStore::new());
        let remote = Arc::new(ScriptedRemote::enabled());
        let service = service_with(kv, remote.clone(), ServiceConfig::default());
        service
            .save_production_data(vec![entry("a", "2025-06-01"), entry("b", "2025-06-02")])
            .await
            .unwrap();
        service.shutdown().await;
        remote.saves.lock().unwrap().clear();

        let outcome = service.delete_production_entry("a").await.unwrap();

        assert_eq!(outcome.deleted.map(|e| e.id), Some("a".to_string()));
        assert_eq!(outcome.remaining.len(), 1);
        assert_eq!(outcome.mirror, MirrorStatus::Delivered);
        assert_eq!(service.get_production_data().await.len(), 1);
        assert_eq!(remote.saved_actions(), vec![SaveAction::SaveProduction]);
    }

    #[tokio::test]
    async fn deleting_unknown_id_is_a_no_op() {
        let kv = Arc::new(InMemoryStore::new());
        let remote = Arc::new(ScriptedRemote::enabled());
        let service = service_with(kv.clone(), remote.clone(), ServiceConfig::default());
        service.save_production_data(vec![entry("a", "2025-06-01")]).await.unwrap();
        service.shutdown().await;
        let before = kv.raw(keys::PRODUCTION).await;
        remote.saves.lock().unwrap().clear();

        let outcome = service.delete_production_entry("missing").await.unwrap();

        assert!(outcome.deleted.is_none());
        assert_eq!(outcome.remaining.len(), 1);
        assert_eq!(outcome.mirror, MirrorStatus::Skipped);
        assert_eq!(kv.raw(keys::PRODUCTION).await, before);
        assert!(remote.saved_actions().is_empty());
    }

    #[tokio::test]
    async fn writes_are_fire_and_forget_by_default() {
        let kv = Arc::new(InMemoryStore::new());
        let remote = Arc::new(ScriptedRemote::enabled());
        let service = service_with(kv, remote.clone(), ServiceConfig::default());

        let outcome = service.save_off_days(vec![]).await.unwrap();
        assert_eq!(outcome.mirror, MirrorStatus::Dispatched);

        service.shutdown().await;
        assert_eq!(remote.saved_actions(), vec![SaveAction::SaveOffDays]);
    }

    #[tokio::test]
    async fn awaited_writes_report_failures() {
        let kv = Arc::new(InMemoryStore::new());
        let remote = Arc::new(ScriptedRemote::enabled());
        *remote.save_result.lock().unwrap() = false;
        let config = ServiceConfig {
            mirror: MirrorPolicy { await_deletes: true, await_writes: true },
            ..ServiceConfig::default()
        };
        let service = service_with(kv, remote, config);

        let outcome = service.save_users(vec![]).await.unwrap();
        assert_eq!(outcome.mirror, MirrorStatus::Failed);
    }

    #[tokio::test]
    async fn log_is_capped_at_capacity() {
        let kv = Arc::new(InMemoryStore::new());
        let service = service_with(kv, Arc::new(ScriptedRemote::default()), ServiceConfig::default());
        let seeded: Vec<ActivityLog> = (0..DEFAULT_LOG_CAPACITY)
            .map(|i| ActivityLog {
                id: format!("log-{i}"),
                timestamp: "2025-06-01 00:00:00".to_string(),
                user_id: "u1".to_string(),
                user_name: "Admin User".to_string(),
                action: "CREATE_PLAN".to_string(),
                details: String::new(),
            })
            .collect();
        service.local.write(&seeded).await.unwrap();

        let newest = service
            .add_log(NewActivityLog {
                user_id: "u1".to_string(),
                user_name: "Admin User".to_string(),
                action: LogAction::AddHoliday,
                details: "2025-08-31".to_string(),
            })
            .await
            .unwrap();

        let logs = service.get_logs().await;
        assert_eq!(logs.len(), DEFAULT_LOG_CAPACITY);
        assert_eq!(logs[0], newest);
        assert_eq!(logs[0].timestamp, "2025-06-15 09:30:00");
        assert_eq!(logs.last().unwrap().id, format!("log-{}", DEFAULT_LOG_CAPACITY - 2));
    }

    #[tokio::test]
    async fn init_seeds_once_and_restores_saved_endpoint() {
        let saved = "https://script.google.com/macros/s/saved/exec";
        let kv = Arc::new(InMemoryStore::with_entries([(keys::REMOTE_URL, saved)]));
        let remote = Arc::new(ScriptedRemote::default());
        let service = service_with(kv.clone(), remote.clone(), ServiceConfig::default());

        service.init().await.unwrap();
        assert_eq!(remote.endpoint().as_deref(), Some(saved));
        assert_eq!(service.get_users().await.len(), seed::initial_users().len());
        assert_eq!(service.get_off_days().await.len(), 2);
        assert!(service.get_production_data().await.is_empty());

        service.save_off_days(vec![]).await.unwrap();
        service.init().await.unwrap();
        assert!(service.get_off_days().await.is_empty());
    }

    #[tokio::test]
    async fn set_remote_url_persists_and_resolves() {
        let kv = Arc::new(InMemoryStore::new());
        let remote = Arc::new(ScriptedRemote::default());
        let service = service_with(kv.clone(), remote.clone(), ServiceConfig::default());

        let active = service.set_remote_url(Some("garbage")).await.unwrap();
        assert_eq!(active, None);
        assert!(!service.is_remote_enabled());

        let url = "https://script.google.com/macros/s/abc/exec";
        let active = service.set_remote_url(Some(url)).await.unwrap();
        assert_eq!(active.as_deref(), Some(url));
        assert_eq!(kv.raw(keys::REMOTE_URL).await.as_deref(), Some(url));
        assert!(service.is_remote_enabled());
    }
}
