//! Serves the sanitized frontend config

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::identity::{ClusterIdentitySource, IdentityError};
use super::sanitize::{sanitize_frontend_config, MarkdownConverter};
use crate::config::DashboardSettings;
use crate::{log_error, log_warn};
use crate::logging::{NoOpLogger, SharedLogger};

const CLUSTER_IDENTITY: &str = "clusterIdentity";

/// Frontend config with markdown converted and the cluster identity filled in
///
/// Sanitization happens once at construction. The identity is looked up on
/// the first request that finds it missing and kept afterwards; a failed
/// lookup is logged (at warn level when the config map has no identity, else
/// error) and the config is served without it.
pub struct FrontendConfigService {
    config: RwLock<Value>,
    identity: Arc<dyn ClusterIdentitySource>,
    logger: SharedLogger,
}

impl FrontendConfigService {
    pub fn new(
        config: &Value,
        converter: &dyn MarkdownConverter,
        identity: Arc<dyn ClusterIdentitySource>,
    ) -> Self {
        let config = match sanitize_frontend_config(config, converter) {
            Value::Null => Value::Object(Map::new()),
            sanitized => sanitized,
        };
        Self {
            config: RwLock::new(config),
            identity,
            logger: Arc::new(NoOpLogger),
        }
    }

    /// Build from the `frontend` section of the settings
    pub fn from_settings(
        settings: &DashboardSettings,
        converter: &dyn MarkdownConverter,
        identity: Arc<dyn ClusterIdentitySource>,
    ) -> Self {
        Self::new(&settings.frontend, converter, identity)
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// The config as sent to the browser
    pub async fn config(&self) -> Value {
        if !self.has_cluster_identity() {
            match self.identity.cluster_identity().await {
                Ok(identity) => {
                    if let Some(config) = self.config.write().as_object_mut() {
                        config.insert(CLUSTER_IDENTITY.to_string(), Value::String(identity));
                    }
                }
                // Config map present, identity unset
                Err(err @ IdentityError::Missing(_)) => {
                    log_warn!(
                        self.logger,
                        "No cluster identity in configmap kube-system/cluster-identity: {}",
                        err
                    );
                }
                Err(err) => {
                    log_error!(
                        self.logger,
                        "Failed to get configmap kube-system/cluster-identity: {}",
                        err
                    );
                }
            }
        }
        self.config.read().clone()
    }

    fn has_cluster_identity(&self) -> bool {
        matches!(
            self.config.read().get(CLUSTER_IDENTITY),
            Some(Value::String(identity)) if !identity.is_empty()
        )
    }
}

impl std::fmt::Debug for FrontendConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontendConfigService")
            .field("has_cluster_identity", &self.has_cluster_identity())
            .finish()
    }
}
