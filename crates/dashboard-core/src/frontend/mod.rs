//! Frontend configuration served to the browser
//!
//! The operator-supplied frontend config contains markdown in a handful of
//! well-known places (alert banner, SLA text, access-restriction help, ...).
//! Those fields are converted to sanitized HTML once, up front; the service
//! then adds the cluster identity read from `kube-system/cluster-identity`.

mod sanitize;
mod identity;
mod service;

pub use sanitize::{sanitize_frontend_config, MarkdownConverter};
pub use identity::{
    ClusterIdentitySource, ConfigMapClusterIdentity, IdentityError, IdentityResult,
    StaticClusterIdentity,
};
pub use service::FrontendConfigService;
