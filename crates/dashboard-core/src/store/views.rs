//! Provider-type views over the secret collection
//!
//! Views are pure functions of the collection and a list of provider types.
//! `ProviderTypeView` memoizes the last result and only recomputes when the
//! collection revision or the type list changes.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::secret_store::SecretStore;
use crate::config::ProviderTypeSettings;
use crate::types::{CollectionSnapshot, Secret};

/// Decides whether a secret belongs to the current tenant (vs. shared with it)
pub type OwnershipPredicate = Arc<dyn Fn(&Secret) -> bool + Send + Sync>;

/// Secrets whose provider type is in `allowed`, in collection order
///
/// An uninitialized collection yields an empty list.
///
/// ```
/// use dashboard_core::store::filter_by_provider_type;
/// use dashboard_core::types::Secret;
///
/// let secrets = vec![Secret::new("a", "x").with_provider_type("aws")];
/// let allowed = vec!["aws".to_string(), "azure".to_string()];
///
/// assert_eq!(filter_by_provider_type(Some(secrets.as_slice()), &allowed).len(), 1);
/// assert!(filter_by_provider_type(Some(secrets.as_slice()), &["gcp".to_string()]).is_empty());
/// assert!(filter_by_provider_type(None, &allowed).is_empty());
/// ```
pub fn filter_by_provider_type(collection: Option<&[Secret]>, allowed: &[String]) -> Vec<Secret> {
    collection
        .unwrap_or_default()
        .iter()
        .filter(|s| {
            s.provider_type()
                .is_some_and(|t| allowed.iter().any(|a| a == t))
        })
        .cloned()
        .collect()
}

struct Memo {
    revision: u64,
    allowed: Vec<String>,
    secrets: Arc<Vec<Secret>>,
}

/// Memoized provider-type filter, optionally restricted to own secrets
#[derive(Default)]
pub struct ProviderTypeView {
    ownership: Option<OwnershipPredicate>,
    memo: Mutex<Option<Memo>>,
}

impl ProviderTypeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only secrets for which `predicate` holds
    pub fn own_only(mut self, predicate: OwnershipPredicate) -> Self {
        self.ownership = Some(predicate);
        self
    }

    /// Filtered secrets for this snapshot and type list
    pub fn compute(&self, snapshot: &CollectionSnapshot, allowed: &[String]) -> Arc<Vec<Secret>> {
        let mut memo = self.memo.lock();
        if let Some(m) = memo.as_ref() {
            if m.revision == snapshot.revision && m.allowed == allowed {
                return m.secrets.clone();
            }
        }

        let mut secrets = filter_by_provider_type(snapshot.as_slice(), allowed);
        if let Some(is_own) = &self.ownership {
            secrets.retain(|s| is_own(s));
        }
        let secrets = Arc::new(secrets);

        *memo = Some(Memo {
            revision: snapshot.revision,
            allowed: allowed.to_vec(),
            secrets: secrets.clone(),
        });
        secrets
    }

    /// Drop the memoized result
    pub fn invalidate(&self) {
        *self.memo.lock() = None;
    }
}

impl std::fmt::Debug for ProviderTypeView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTypeView")
            .field("own_only", &self.ownership.is_some())
            .field("memoized", &self.memo.lock().is_some())
            .finish()
    }
}

/// Recognized infrastructure and DNS provider types
///
/// Maintained outside the store (cloud profiles, installed extensions) and
/// updatable at runtime.
#[derive(Debug, Default)]
pub struct ProviderTypeLists {
    infrastructure: RwLock<Vec<String>>,
    dns: RwLock<Vec<String>>,
}

impl ProviderTypeLists {
    pub fn new(infrastructure: Vec<String>, dns: Vec<String>) -> Self {
        Self {
            infrastructure: RwLock::new(infrastructure),
            dns: RwLock::new(dns),
        }
    }

    pub fn from_settings(settings: &ProviderTypeSettings) -> Self {
        Self::new(settings.infrastructure.clone(), settings.dns.clone())
    }

    pub fn infrastructure(&self) -> Vec<String> {
        self.infrastructure.read().clone()
    }

    pub fn dns(&self) -> Vec<String> {
        self.dns.read().clone()
    }

    pub fn set_infrastructure(&self, types: Vec<String>) {
        *self.infrastructure.write() = types;
    }

    pub fn set_dns(&self, types: Vec<String>) {
        *self.dns.write() = types;
    }
}

/// The two secret lists the dashboard shows
///
/// - infrastructure secrets: provider type is a known infrastructure type
/// - DNS secrets: provider type is a known DNS type and the secret is the
///   tenant's own (shared secret bindings cannot back DNS providers)
pub struct SecretViews {
    store: Arc<SecretStore>,
    provider_types: Arc<ProviderTypeLists>,
    infrastructure: ProviderTypeView,
    dns: ProviderTypeView,
}

impl SecretViews {
    pub fn new(
        store: Arc<SecretStore>,
        provider_types: Arc<ProviderTypeLists>,
        is_own: OwnershipPredicate,
    ) -> Self {
        Self {
            store,
            provider_types,
            infrastructure: ProviderTypeView::new(),
            dns: ProviderTypeView::new().own_only(is_own),
        }
    }

    pub fn infrastructure_secrets(&self) -> Arc<Vec<Secret>> {
        self.infrastructure
            .compute(&self.store.snapshot(), &self.provider_types.infrastructure())
    }

    pub fn dns_secrets(&self) -> Arc<Vec<Secret>> {
        self.dns.compute(&self.store.snapshot(), &self.provider_types.dns())
    }

    pub fn store(&self) -> &Arc<SecretStore> {
        &self.store
    }
}
