//! Dashboard Core
//!
//! Client-side state for the cluster dashboard's cloud-provider secrets.
//! This crate is runtime agnostic: it brings no executor, talks to the
//! backend through a `SecretApi`, and reports through injected `Notifier`
//! and `Logger` implementations.
//!
//! ## Secret store
//!
//! `SecretStore` caches the secrets of the current tenant namespace and keeps
//! the cache in step with every fetch, create, update and delete. Views derive
//! the infrastructure and DNS secret lists by provider type.
//!
//! ```rust,ignore
//! use dashboard_core::{HttpSecretApi, LogNotifier, SecretStore};
//!
//! let api = Arc::new(HttpSecretApi::new("https://dashboard.example.org")?);
//! let store = SecretStore::new(api, Arc::new(LogNotifier::new(logger)), "garden-dev");
//!
//! store.fetch_all(None).await?;
//! let secret = store.get("garden-dev", "my-aws");
//! ```
//!
//! ## Frontend config
//!
//! `FrontendConfigService` serves the operator's frontend config with its
//! markdown fields sanitized and the cluster identity filled in.

pub mod types;
pub mod logging;
pub mod notify;
pub mod config;
pub mod api;
pub mod store;
pub mod frontend;

// Re-export commonly used types
pub use types::{Secret, SecretKey, SecretMetadata, ProviderInfo, CollectionSnapshot};

pub use logging::{Logger, SharedLogger, NoOpLogger, ConsoleLogger};

pub use notify::{Notifier, SharedNotifier, NoOpNotifier, LogNotifier, RecordingNotifier};

pub use config::{
    SettingsProvider, ConfigError, ConfigResult, DashboardSettings,
    MemorySettingsProvider, FileSettingsProvider,
};

pub use api::{SecretApi, SecretApiError, SecretApiResult, HttpSecretApi, MemorySecretApi};

pub use store::{SecretStore, SecretViews, ProviderTypeLists, ProviderTypeView, filter_by_provider_type};

pub use frontend::{
    FrontendConfigService, MarkdownConverter, ClusterIdentitySource,
    ConfigMapClusterIdentity, StaticClusterIdentity, sanitize_frontend_config,
};
