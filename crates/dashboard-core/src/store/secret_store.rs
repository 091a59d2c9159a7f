//! The secret collection store

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use super::collection;
use crate::api::{HttpSecretApi, SecretApiResult, SharedSecretApi};
use crate::config::DashboardSettings;
use crate::logging::{NoOpLogger, SharedLogger};
use crate::notify::SharedNotifier;
use crate::types::{CollectionSnapshot, Secret, SecretKey};
use crate::{log_debug, log_error, log_info};

pub const MSG_CREATED: &str = "Cloud Provider secret created";
pub const MSG_UPDATED: &str = "Cloud Provider secret updated";
pub const MSG_DELETED: &str = "Cloud Provider secret deleted";

/// Namespace-scoped cache of cloud-provider secrets
///
/// The collection starts uninitialized, is replaced wholesale by
/// [`fetch_all`](Self::fetch_all) and patched by the mutation calls with
/// whatever the backend answered. Failed mutations leave it untouched; a
/// failed fetch resets it.
///
/// Readers either query the store directly or [`subscribe`](Self::subscribe)
/// to receive a fresh [`CollectionSnapshot`] after every change.
///
/// Overlapping `fetch_all` calls are not serialized: whichever response
/// arrives last wins, and a `reset` issued while a fetch is in flight is
/// overwritten if that fetch later succeeds. Callers that care must await one
/// fetch before starting the next.
pub struct SecretStore {
    api: SharedSecretApi,
    notifier: SharedNotifier,
    logger: SharedLogger,
    namespace: RwLock<String>,
    state: watch::Sender<CollectionSnapshot>,
}

impl SecretStore {
    /// Create a store for the given tenant namespace
    pub fn new(api: SharedSecretApi, notifier: SharedNotifier, namespace: impl Into<String>) -> Self {
        let (state, _) = watch::channel(CollectionSnapshot::default());
        Self {
            api,
            notifier,
            logger: Arc::new(NoOpLogger),
            namespace: RwLock::new(namespace.into()),
            state,
        }
    }

    /// Create a store backed by the HTTP API described in `settings`
    pub fn from_settings(settings: &DashboardSettings, notifier: SharedNotifier) -> SecretApiResult<Self> {
        let api = HttpSecretApi::from_settings(&settings.api)?;
        Ok(Self::new(Arc::new(api), notifier, settings.namespace_or_default()))
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    // ==================== NAMESPACE ====================

    /// The current tenant namespace
    pub fn current_namespace(&self) -> String {
        self.namespace.read().clone()
    }

    /// Switch tenant; the collection is left as is until the next fetch
    pub fn set_current_namespace(&self, namespace: impl Into<String>) {
        *self.namespace.write() = namespace.into();
    }

    /// The given namespace if present and non-empty, else the tenant namespace
    pub fn resolve_namespace(&self, namespace: Option<&str>) -> String {
        match namespace {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ => self.current_namespace(),
        }
    }

    // ==================== READS ====================

    pub fn snapshot(&self) -> CollectionSnapshot {
        self.state.borrow().clone()
    }

    /// Receive a new snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<CollectionSnapshot> {
        self.state.subscribe()
    }

    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    /// Whether the collection is uninitialized (never fetched, or reset)
    pub fn is_initial(&self) -> bool {
        self.state.borrow().is_initial()
    }

    /// The collection, `None` while uninitialized
    pub fn secrets(&self) -> Option<Arc<Vec<Secret>>> {
        self.state.borrow().secrets.clone()
    }

    /// Look up a secret; `None` when absent or uninitialized
    pub fn get(&self, namespace: &str, name: &str) -> Option<Secret> {
        let state = self.state.borrow();
        state
            .as_slice()?
            .iter()
            .find(|s| s.matches(namespace, name))
            .cloned()
    }

    pub fn get_by_key(&self, key: &SecretKey) -> Option<Secret> {
        self.get(&key.namespace, &key.name)
    }

    // ==================== OPERATIONS ====================

    /// Clear the collection back to uninitialized
    pub fn reset(&self) {
        self.state.send_if_modified(|state| {
            if state.secrets.is_none() {
                return false;
            }
            state.secrets = None;
            state.revision += 1;
            true
        });
    }

    /// Replace the collection with every secret in `namespace`
    ///
    /// On failure the collection is reset and the error returned unchanged.
    pub async fn fetch_all(&self, namespace: Option<&str>) -> SecretApiResult<()> {
        let namespace = self.resolve_namespace(namespace);
        log_debug!(self.logger, "Fetching cloud provider secrets in {}", namespace);

        match self.api.list_secrets(&namespace).await {
            Ok(secrets) => {
                log_debug!(self.logger, "Fetched {} secrets in {}", secrets.len(), namespace);
                self.state.send_modify(|state| {
                    state.secrets = Some(Arc::new(secrets));
                    state.revision += 1;
                });
                Ok(())
            }
            Err(err) => {
                log_error!(self.logger, "Failed to fetch secrets in {}: {}", namespace, err);
                self.reset();
                Err(err)
            }
        }
    }

    /// Create a secret and add the backend's answer to the collection
    ///
    /// Returns the secret as stored in the collection. Before the first
    /// successful fetch the collection is left uninitialized and the
    /// backend's answer is returned.
    pub async fn create(&self, secret: &Secret) -> SecretApiResult<Secret> {
        let namespace = self.resolve_namespace(secret.namespace());
        let created = self.api.create_secret(&namespace, secret).await?;

        self.notifier.notify_success(MSG_CREATED);
        log_info!(self.logger, "Created secret {}/{}", namespace, created.name());
        Ok(self.upsert_local(with_namespace(created, namespace)))
    }

    /// Update a secret and merge the backend's answer into the collection
    ///
    /// Fields the answer lacks keep their cached values; an unknown key is
    /// appended.
    pub async fn update(&self, secret: &Secret) -> SecretApiResult<Secret> {
        let namespace = self.resolve_namespace(secret.namespace());
        let updated = self
            .api
            .update_secret(&namespace, secret.name(), secret)
            .await?;

        self.notifier.notify_success(MSG_UPDATED);
        log_info!(self.logger, "Updated secret {}/{}", namespace, secret.name());
        Ok(self.upsert_local(with_namespace(updated, namespace)))
    }

    /// Delete a secret and drop it from the collection
    ///
    /// The removal is keyed by the secret the backend echoes back. A key that
    /// is not cached is not an error.
    pub async fn delete(&self, namespace: Option<&str>, name: &str) -> SecretApiResult<Secret> {
        let namespace = self.resolve_namespace(namespace);
        let deleted = self.api.delete_secret(&namespace, name).await?;

        let key = SecretKey::new(
            deleted.namespace().unwrap_or(namespace.as_str()),
            if deleted.name().is_empty() { name } else { deleted.name() },
        );

        self.notifier.notify_success(MSG_DELETED);
        log_info!(self.logger, "Deleted secret {}", key);
        self.remove_local(&key);
        Ok(deleted)
    }

    // ==================== LOCAL STATE ====================

    /// Merge into the cached collection; an uninitialized collection stays so
    /// and the backend's answer is returned as is
    fn upsert_local(&self, secret: Secret) -> Secret {
        let mut stored = None;
        self.state.send_if_modified(|state| {
            let Some(list) = state.secrets.as_mut() else {
                return false;
            };
            let list = Arc::make_mut(list);
            let index = collection::upsert(list, secret.clone());
            stored = Some(list[index].clone());
            state.revision += 1;
            true
        });
        stored.unwrap_or(secret)
    }

    fn remove_local(&self, key: &SecretKey) -> bool {
        self.state.send_if_modified(|state| {
            let Some(list) = state.secrets.as_mut() else {
                return false;
            };
            if collection::find_index(list.as_slice(), key).is_none() {
                return false;
            }
            collection::remove(Arc::make_mut(list), key);
            state.revision += 1;
            true
        })
    }
}

/// Fill in the namespace the request was made for when the answer lacks one
fn with_namespace(mut secret: Secret, namespace: String) -> Secret {
    if secret.metadata.namespace.is_none() {
        secret.metadata.namespace = Some(namespace);
    }
    secret
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SecretStore")
            .field("namespace", &*self.namespace.read())
            .field("revision", &state.revision)
            .field("secrets", &state.secrets.as_ref().map(|s| s.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::api::{MemorySecretApi, SecretApi, SecretApiError};
    use crate::logging::CapturingLogger;
    use crate::notify::{NoOpNotifier, RecordingNotifier};

    fn store_with(api: Arc<MemorySecretApi>) -> (SecretStore, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let store = SecretStore::new(api, notifier.clone(), "garden-dev");
        (store, notifier)
    }

    fn seeded() -> Arc<MemorySecretApi> {
        Arc::new(MemorySecretApi::with_secrets([
            Secret::new("garden-dev", "aws-1").with_provider_type("aws"),
            Secret::new("garden-dev", "gcp-1").with_provider_type("gcp"),
        ]))
    }

    fn keys(store: &SecretStore) -> Vec<String> {
        store
            .secrets()
            .map(|s| s.iter().map(|s| s.key().to_string()).collect())
            .unwrap_or_default()
    }

    fn assert_unique(store: &SecretStore) {
        let secrets = store.secrets().unwrap();
        let unique: HashSet<_> = secrets.iter().map(|s| s.key()).collect();
        assert_eq!(unique.len(), secrets.len());
    }

    #[test]
    fn test_starts_uninitialized() {
        let (store, _) = store_with(seeded());
        assert!(store.is_initial());
        assert!(store.secrets().is_none());
        assert_eq!(store.revision(), 0);
        assert!(store.get("garden-dev", "aws-1").is_none());
    }

    #[test]
    fn test_resolve_namespace() {
        let (store, _) = store_with(seeded());
        assert_eq!(store.resolve_namespace(Some("other")), "other");
        assert_eq!(store.resolve_namespace(Some("")), "garden-dev");
        assert_eq!(store.resolve_namespace(None), "garden-dev");

        store.set_current_namespace("garden-prod");
        assert_eq!(store.resolve_namespace(None), "garden-prod");
    }

    #[tokio::test]
    async fn test_fetch_all_replaces_in_api_order() {
        let api = seeded();
        let (store, _) = store_with(api.clone());

        store.fetch_all(None).await.unwrap();
        assert_eq!(keys(&store), vec!["garden-dev/aws-1", "garden-dev/gcp-1"]);
        assert_eq!(api.calls(), vec!["list garden-dev"]);

        // Empty namespace is initialized, not initial
        store.fetch_all(Some("empty")).await.unwrap();
        assert!(!store.is_initial());
        assert_eq!(store.secrets().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_resets_and_propagates() {
        let api = seeded();
        let logger = Arc::new(CapturingLogger::default());
        let notifier = Arc::new(NoOpNotifier);
        let store = SecretStore::new(api.clone(), notifier, "garden-dev").with_logger(logger.clone());

        store.fetch_all(None).await.unwrap();
        assert!(!store.is_initial());

        api.fail_next(SecretApiError::status(500, "boom"));
        let err = store.fetch_all(None).await.unwrap_err();

        assert!(matches!(err, SecretApiError::Status { status: 500, .. }));
        assert!(store.is_initial());
        assert!(store.get("garden-dev", "aws-1").is_none());
        assert_eq!(logger.lines("error").len(), 1);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let (store, _) = store_with(seeded());
        store.reset();
        assert_eq!(store.revision(), 0);

        store.fetch_all(None).await.unwrap();
        store.reset();
        let revision = store.revision();
        store.reset();

        assert!(store.is_initial());
        assert_eq!(store.revision(), revision);
    }

    #[tokio::test]
    async fn test_get() {
        let (store, _) = store_with(seeded());
        store.fetch_all(None).await.unwrap();

        let secret = store.get("garden-dev", "gcp-1").unwrap();
        assert_eq!(secret.provider_type(), Some("gcp"));
        assert!(store.get("other", "gcp-1").is_none());
        assert!(store.get_by_key(&SecretKey::new("garden-dev", "aws-1")).is_some());
    }

    #[tokio::test]
    async fn test_create_then_get_is_superset() {
        let (store, notifier) = store_with(seeded());
        store.fetch_all(None).await.unwrap();

        let input = Secret::named("azure-1")
            .with_provider_type("azure")
            .with_field("data", json!({ "clientID": "c" }));
        let stored = store.create(&input).await.unwrap();

        let fetched = store.get("garden-dev", "azure-1").unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.namespace(), Some("garden-dev"));
        assert_eq!(fetched.provider_type(), Some("azure"));
        assert_eq!(fetched.fields["data"], input.fields["data"]);
        assert!(fetched.metadata.extra.contains_key("uid"));
        assert!(fetched.metadata.extra.contains_key("resourceVersion"));

        assert_eq!(keys(&store).last().map(String::as_str), Some("garden-dev/azure-1"));
        assert_eq!(notifier.messages(), vec![MSG_CREATED]);
    }

    #[tokio::test]
    async fn test_create_uses_explicit_namespace() {
        let api = seeded();
        let (store, _) = store_with(api.clone());
        store.fetch_all(None).await.unwrap();

        store.create(&Secret::new("shared", "x")).await.unwrap();
        assert_eq!(api.stored("shared").len(), 1);
        assert!(store.get("shared", "x").is_some());
    }

    #[tokio::test]
    async fn test_create_failure_leaves_state_untouched() {
        let api = seeded();
        let (store, notifier) = store_with(api.clone());
        store.fetch_all(None).await.unwrap();
        let before = store.snapshot();

        // Duplicate name conflicts on the backend
        let err = store.create(&Secret::named("aws-1")).await.unwrap_err();

        assert!(matches!(err, SecretApiError::Conflict(_)));
        assert_eq!(store.revision(), before.revision);
        assert_eq!(keys(&store), vec!["garden-dev/aws-1", "garden-dev/gcp-1"]);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_onto_existing() {
        let api = Arc::new(MemorySecretApi::with_secrets([
            Secret::new("a", "x").with_provider_type("aws"),
        ]));
        let (store, notifier) = store_with(api);
        store.fetch_all(Some("a")).await.unwrap();

        store
            .update(&Secret::new("a", "x").with_field("region", json!("eu")))
            .await
            .unwrap();

        let secrets = store.secrets().unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].key(), SecretKey::new("a", "x"));
        assert_eq!(secrets[0].provider_type(), Some("aws"));
        assert_eq!(secrets[0].fields["region"], "eu");
        assert_eq!(notifier.last().as_deref(), Some(MSG_UPDATED));
    }

    #[tokio::test]
    async fn test_update_unknown_key_appends() {
        let (store, _) = store_with(seeded());
        store.fetch_all(None).await.unwrap();

        store.update(&Secret::named("new-one")).await.unwrap();
        assert_eq!(
            keys(&store),
            vec!["garden-dev/aws-1", "garden-dev/gcp-1", "garden-dev/new-one"]
        );
    }

    #[tokio::test]
    async fn test_update_failure_propagates_unchanged() {
        let api = seeded();
        let (store, notifier) = store_with(api.clone());
        store.fetch_all(None).await.unwrap();

        api.fail_next(SecretApiError::status(422, "invalid"));
        let err = store
            .update(&Secret::named("aws-1").with_field("region", json!("eu")))
            .await
            .unwrap_err();

        assert!(matches!(err, SecretApiError::Status { status: 422, ref message } if message == "invalid"));
        assert!(!store.get("garden-dev", "aws-1").unwrap().fields.contains_key("region"));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_by_echo() {
        let (store, notifier) = store_with(seeded());
        store.fetch_all(None).await.unwrap();

        let deleted = store.delete(None, "aws-1").await.unwrap();
        assert_eq!(deleted.name(), "aws-1");
        assert_eq!(keys(&store), vec!["garden-dev/gcp-1"]);
        assert_eq!(notifier.messages(), vec![MSG_DELETED]);
    }

    #[tokio::test]
    async fn test_delete_uncached_key_is_noop() {
        let api = seeded();
        let (store, _) = store_with(api.clone());
        store.fetch_all(None).await.unwrap();

        // Exists on the backend, not in the cache
        api.create_secret("garden-dev", &Secret::named("late")).await.unwrap();
        let revision = store.revision();

        store.delete(None, "late").await.unwrap();
        assert_eq!(store.revision(), revision);
        assert_eq!(keys(&store), vec!["garden-dev/aws-1", "garden-dev/gcp-1"]);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_entry() {
        let (store, notifier) = store_with(seeded());
        store.fetch_all(None).await.unwrap();
        let revision = store.revision();

        assert!(matches!(
            store.delete(None, "missing").await,
            Err(SecretApiError::NotFound(_))
        ));
        assert_eq!(store.secrets().unwrap().len(), 2);
        assert_eq!(store.revision(), revision);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_delete_before_fetch_stays_uninitialized() {
        let api = seeded();
        let (store, notifier) = store_with(api.clone());

        let deleted = store.delete(None, "aws-1").await.unwrap();

        assert_eq!(deleted.name(), "aws-1");
        assert!(store.is_initial());
        assert_eq!(store.revision(), 0);
        assert_eq!(api.stored("garden-dev").len(), 1);
        assert_eq!(notifier.messages(), vec![MSG_DELETED]);
    }

    #[tokio::test]
    async fn test_mutations_before_fetch_keep_collection_uninitialized() {
        let api = seeded();
        let (store, notifier) = store_with(api.clone());

        let created = store.create(&Secret::named("azure-1")).await.unwrap();
        assert_eq!(created.key(), SecretKey::new("garden-dev", "azure-1"));
        assert!(created.metadata.extra.contains_key("resourceVersion"));

        let updated = store
            .update(&Secret::named("aws-1").with_field("region", json!("eu")))
            .await
            .unwrap();
        assert_eq!(updated.fields["region"], "eu");

        assert!(store.is_initial());
        assert_eq!(store.revision(), 0);
        assert!(store.get("garden-dev", "azure-1").is_none());
        assert_eq!(notifier.messages(), vec![MSG_CREATED, MSG_UPDATED]);

        // The next fetch brings in the whole namespace
        store.fetch_all(None).await.unwrap();
        assert_eq!(
            keys(&store),
            vec!["garden-dev/aws-1", "garden-dev/gcp-1", "garden-dev/azure-1"]
        );
    }

    #[tokio::test]
    async fn test_mutations_after_reset_keep_collection_uninitialized() {
        let (store, _) = store_with(seeded());
        store.fetch_all(None).await.unwrap();
        store.reset();
        let revision = store.revision();

        store.create(&Secret::named("azure-1")).await.unwrap();
        assert!(store.is_initial());
        assert_eq!(store.revision(), revision);
    }

    #[tokio::test]
    async fn test_create_on_cached_key_merges_in_place() {
        let api = seeded();
        let (store, notifier) = store_with(api.clone());
        store.fetch_all(None).await.unwrap();

        // Gone on the backend, still cached locally
        api.delete_secret("garden-dev", "aws-1").await.unwrap();

        let stored = store
            .create(&Secret::named("aws-1").with_field("region", json!("eu")))
            .await
            .unwrap();

        assert_eq!(keys(&store), vec!["garden-dev/aws-1", "garden-dev/gcp-1"]);
        assert_eq!(stored.provider_type(), Some("aws"));
        assert_eq!(stored.fields["region"], "eu");
        assert_eq!(store.get("garden-dev", "aws-1").unwrap(), stored);
        assert_unique(&store);
        assert_eq!(notifier.messages(), vec![MSG_CREATED]);
    }

    #[tokio::test]
    async fn test_keys_stay_unique_across_mutations() {
        let (store, _) = store_with(seeded());
        store.fetch_all(None).await.unwrap();

        for round in 0..5 {
            let name = format!("s-{}", round % 3);
            if store.get("garden-dev", &name).is_none() {
                store.create(&Secret::named(&name)).await.unwrap();
            }
            assert_unique(&store);

            store
                .update(&Secret::named(&name).with_field("round", json!(round)))
                .await
                .unwrap();
            assert_unique(&store);

            store.update(&Secret::named("aws-1")).await.unwrap();
            assert_unique(&store);

            if round % 2 == 1 {
                store.delete(None, &name).await.unwrap();
                assert_unique(&store);
            }
        }
    }

    #[tokio::test]
    async fn test_subscribers_see_every_change() {
        let (store, _) = store_with(seeded());
        let mut rx = store.subscribe();
        assert!(rx.borrow().is_initial());

        store.fetch_all(None).await.unwrap();
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.len(), 2);

        store.create(&Secret::named("third")).await.unwrap();
        let latest = rx.borrow_and_update().clone();
        assert_eq!(latest.len(), 3);
        assert!(latest.revision > snapshot.revision);

        // Snapshots are immutable once handed out
        assert_eq!(snapshot.len(), 2);
    }

    // ==================== STALE OVERWRITE HAZARD ====================

    /// API whose listing of `slow` blocks until released
    struct GatedApi {
        gate: Notify,
        lists: AtomicUsize,
    }

    impl GatedApi {
        fn new() -> Self {
            Self {
                gate: Notify::new(),
                lists: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SecretApi for GatedApi {
        async fn list_secrets(&self, namespace: &str) -> SecretApiResult<Vec<Secret>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if namespace == "slow" {
                self.gate.notified().await;
            }
            Ok(vec![Secret::new(namespace, "only")])
        }

        async fn create_secret(&self, _: &str, data: &Secret) -> SecretApiResult<Secret> {
            Ok(data.clone())
        }

        async fn update_secret(&self, _: &str, _: &str, data: &Secret) -> SecretApiResult<Secret> {
            Ok(data.clone())
        }

        async fn delete_secret(&self, namespace: &str, name: &str) -> SecretApiResult<Secret> {
            Ok(Secret::new(namespace, name))
        }
    }

    #[tokio::test]
    async fn test_overlapping_fetches_last_resolved_wins() {
        let api = Arc::new(GatedApi::new());
        let store = SecretStore::new(api.clone(), Arc::new(NoOpNotifier), "garden-dev");

        let slow = store.fetch_all(Some("slow"));
        let fast = async {
            store.fetch_all(Some("fast")).await.unwrap();
            assert_eq!(keys(&store), vec!["fast/only"]);
            api.gate.notify_one();
        };
        let (slow, _) = futures::join!(slow, fast);
        slow.unwrap();

        // Issued first, resolved last: its stale result sticks
        assert_eq!(api.lists.load(Ordering::SeqCst), 2);
        assert_eq!(keys(&store), vec!["slow/only"]);
    }

    #[tokio::test]
    async fn test_reset_during_fetch_is_overwritten() {
        let api = Arc::new(GatedApi::new());
        let store = SecretStore::new(api.clone(), Arc::new(NoOpNotifier), "garden-dev");
        store.fetch_all(Some("fast")).await.unwrap();

        let fetch = store.fetch_all(Some("slow"));
        let reset = async {
            store.reset();
            assert!(store.is_initial());
            api.gate.notify_one();
        };
        let (fetch, _) = futures::join!(fetch, reset);
        fetch.unwrap();

        assert!(!store.is_initial());
        assert_eq!(keys(&store), vec!["slow/only"]);
    }
}
