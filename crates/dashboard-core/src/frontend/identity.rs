//! Cluster identity lookup
//!
//! The identity lives in the `cluster-identity` key of the
//! `kube-system/cluster-identity` config map.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ApiSettings;
use crate::logging;

const LOG_MODULE: &str = "frontend::identity";
const IDENTITY_KEY: &str = "cluster-identity";

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}")]
    Status { status: u16 },

    #[error("Config map has no {0} entry")]
    Missing(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Source of the cluster identity string
#[async_trait]
pub trait ClusterIdentitySource: Send + Sync {
    async fn cluster_identity(&self) -> IdentityResult<String>;
}

/// Fixed identity, for tests and clusters configured out of band
#[derive(Debug, Clone)]
pub struct StaticClusterIdentity(String);

impl StaticClusterIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }
}

#[async_trait]
impl ClusterIdentitySource for StaticClusterIdentity {
    async fn cluster_identity(&self) -> IdentityResult<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigMap {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

impl ConfigMap {
    fn into_identity(mut self) -> IdentityResult<String> {
        self.data
            .remove(IDENTITY_KEY)
            .ok_or_else(|| IdentityError::Missing(IDENTITY_KEY.to_string()))
    }
}

/// Reads the identity config map from the Kubernetes API server
#[derive(Clone)]
pub struct ConfigMapClusterIdentity {
    url: Url,
    client: reqwest::Client,
    token: Option<String>,
    timeout: Duration,
}

impl ConfigMapClusterIdentity {
    pub fn new(api_server: impl AsRef<str>) -> IdentityResult<Self> {
        let mut url = Url::parse(api_server.as_ref())
            .map_err(|e| IdentityError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| IdentityError::InvalidUrl(api_server.as_ref().to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", "namespaces", "kube-system", "configmaps", IDENTITY_KEY]);
        Ok(Self {
            url,
            client: reqwest::Client::new(),
            token: None,
            timeout: Duration::from_secs(10),
        })
    }

    pub fn from_settings(settings: &ApiSettings) -> IdentityResult<Self> {
        let mut source = Self::new(&settings.base_url)?;
        source.timeout = Duration::from_secs(settings.timeout_secs);
        source.token = settings.token.clone();
        Ok(source)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Debug for ConfigMapClusterIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigMapClusterIdentity")
            .field("url", &self.url.as_str())
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

#[async_trait]
impl ClusterIdentitySource for ConfigMapClusterIdentity {
    async fn cluster_identity(&self) -> IdentityResult<String> {
        let mut request = self.client.get(self.url.clone()).timeout(self.timeout);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        logging::debug(LOG_MODULE, &format!("GET {} -> {}", self.url, status));
        if !status.is_success() {
            return Err(IdentityError::Status { status: status.as_u16() });
        }
        response.json::<ConfigMap>().await?.into_identity()
    }
}
