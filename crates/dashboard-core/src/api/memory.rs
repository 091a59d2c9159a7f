//! In-process secret backend
//!
//! Behaves like the dashboard backend closely enough for store tests: it
//! assigns `uid` and `resourceVersion` on every write, rejects duplicate
//! creates, treats update as a full replace (PUT semantics) and echoes deleted
//! secrets. Failures can be injected for the next call.

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use super::traits::{SecretApi, SecretApiError, SecretApiResult};
use crate::types::Secret;

#[derive(Debug, Default)]
struct Backend {
    namespaces: BTreeMap<String, Vec<Secret>>,
    next_version: u64,
    failures: VecDeque<SecretApiError>,
    calls: Vec<String>,
}

impl Backend {
    fn begin(&mut self, call: String) -> SecretApiResult<()> {
        self.calls.push(call);
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Stamp server-assigned fields onto a stored copy
    fn stamp(&mut self, namespace: &str, secret: &Secret) -> Secret {
        self.next_version += 1;
        let mut stored = secret.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        stored
            .metadata
            .extra
            .entry("uid")
            .or_insert_with(|| json!(format!("{}-{}", namespace, secret.name())));
        stored
            .metadata
            .extra
            .insert("resourceVersion".to_string(), json!(self.next_version.to_string()));
        stored
    }
}

/// In-memory [`SecretApi`] for tests and offline demos
///
/// # Example
///
/// ```
/// use dashboard_core::api::{MemorySecretApi, SecretApi};
/// use dashboard_core::types::Secret;
///
/// futures::executor::block_on(async {
///     let api = MemorySecretApi::new();
///     api.create_secret("garden-dev", &Secret::named("my-aws")).await.unwrap();
///     assert_eq!(api.list_secrets("garden-dev").await.unwrap().len(), 1);
/// });
/// ```
#[derive(Debug, Default)]
pub struct MemorySecretApi {
    backend: Mutex<Backend>,
}

impl MemorySecretApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with secrets (stored as given)
    pub fn with_secrets(secrets: impl IntoIterator<Item = Secret>) -> Self {
        let api = Self::new();
        {
            let mut backend = api.backend.lock();
            for secret in secrets {
                let namespace = secret.namespace().unwrap_or_default().to_string();
                backend.namespaces.entry(namespace).or_default().push(secret);
            }
        }
        api
    }

    /// Make the next call fail with `err`; queued failures fire in order
    pub fn fail_next(&self, err: SecretApiError) {
        self.backend.lock().failures.push_back(err);
    }

    /// Calls received so far, e.g. `"list garden-dev"`
    pub fn calls(&self) -> Vec<String> {
        self.backend.lock().calls.clone()
    }

    /// Secrets currently stored for a namespace
    pub fn stored(&self, namespace: &str) -> Vec<Secret> {
        self.backend
            .lock()
            .namespaces
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SecretApi for MemorySecretApi {
    async fn list_secrets(&self, namespace: &str) -> SecretApiResult<Vec<Secret>> {
        let mut backend = self.backend.lock();
        backend.begin(format!("list {}", namespace))?;
        Ok(backend.namespaces.get(namespace).cloned().unwrap_or_default())
    }

    async fn create_secret(&self, namespace: &str, data: &Secret) -> SecretApiResult<Secret> {
        let mut backend = self.backend.lock();
        backend.begin(format!("create {}/{}", namespace, data.name()))?;

        let exists = backend
            .namespaces
            .get(namespace)
            .is_some_and(|list| list.iter().any(|s| s.name() == data.name()));
        if exists {
            return Err(SecretApiError::Conflict(format!("{}/{}", namespace, data.name())));
        }

        let stored = backend.stamp(namespace, data);
        backend
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn update_secret(&self, namespace: &str, name: &str, data: &Secret) -> SecretApiResult<Secret> {
        let mut backend = self.backend.lock();
        backend.begin(format!("update {}/{}", namespace, name))?;

        let mut payload = data.clone();
        payload.metadata.name = name.to_string();
        let stored = backend.stamp(namespace, &payload);

        let list = backend.namespaces.entry(namespace.to_string()).or_default();
        match list.iter().position(|s| s.name() == name) {
            Some(index) => list[index] = stored.clone(),
            None => list.push(stored.clone()),
        }
        Ok(stored)
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> SecretApiResult<Secret> {
        let mut backend = self.backend.lock();
        backend.begin(format!("delete {}/{}", namespace, name))?;

        let list = backend
            .namespaces
            .get_mut(namespace)
            .ok_or_else(|| SecretApiError::NotFound(format!("{}/{}", namespace, name)))?;
        let index = list
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| SecretApiError::NotFound(format!("{}/{}", namespace, name)))?;
        Ok(list.remove(index))
    }
}
