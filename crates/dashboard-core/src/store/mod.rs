//! Client-side cache of cloud-provider secrets
//!
//! `SecretStore` holds the collection for the current tenant and keeps it in
//! step with the backend: a fetch replaces it wholesale, create/update upsert
//! the entity the backend answered with, delete removes it. `views` derives
//! the filtered lists the UI shows.
//!
//! ```rust,ignore
//! use dashboard_core::store::{SecretStore, SecretViews, ProviderTypeLists};
//!
//! let store = Arc::new(SecretStore::new(api, notifier, "garden-dev"));
//! store.fetch_all(None).await?;
//!
//! let views = SecretViews::new(store.clone(), provider_types, is_own_secret);
//! for secret in views.infrastructure_secrets().iter() {
//!     println!("{}", secret.key());
//! }
//! ```

mod collection;
mod secret_store;
pub mod views;

pub use collection::{find_index, upsert, remove};
pub use secret_store::{SecretStore, MSG_CREATED, MSG_UPDATED, MSG_DELETED};
pub use views::{
    filter_by_provider_type, OwnershipPredicate, ProviderTypeLists, ProviderTypeView, SecretViews,
};
