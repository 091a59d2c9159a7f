//! Settings structure

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::traits::{ConfigError, ConfigResult};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Everything the dashboard core needs to talk to its backend
///
/// ```yaml
/// api:
///   baseUrl: https://dashboard.example.org
///   timeoutSecs: 5
/// namespace: garden-dev
/// providerTypes:
///   infrastructure: [aws, azure, gcp, openstack]
///   dns: [aws-route53, azure-dns, google-clouddns]
/// frontend:
///   alert:
///     type: warning
///     message: "**Maintenance** tonight"
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSettings {
    #[serde(default)]
    pub api: ApiSettings,

    /// Default tenant namespace for namespace-less operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default)]
    pub provider_types: ProviderTypeSettings,

    /// Raw frontend configuration, served after sanitization
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub frontend: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    pub base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Provider types recognized for secret classification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderTypeSettings {
    pub infrastructure: Vec<String>,
    pub dns: Vec<String>,
}

impl DashboardSettings {
    /// Check the values a client cannot work without
    pub fn validate(&self) -> ConfigResult<()> {
        reqwest::Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::invalid("api.baseUrl", e.to_string()))?;

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::invalid("api.timeoutSecs", "must be greater than zero"));
        }

        if matches!(self.namespace.as_deref(), Some(ns) if ns.trim().is_empty()) {
            return Err(ConfigError::invalid("namespace", "must not be blank"));
        }

        Ok(())
    }

    /// Tenant namespace, or `"default"` when none is configured
    pub fn namespace_or_default(&self) -> &str {
        self.namespace.as_deref().unwrap_or("default")
    }
}

/// Apply `DASHBOARD_API_URL`, `DASHBOARD_NAMESPACE` and `DASHBOARD_TOKEN`
///
/// `lookup` is usually `|k| std::env::var(k).ok()`; tests pass a map.
pub fn apply_env_overrides<F>(settings: &mut DashboardSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DASHBOARD_API_URL").filter(|v| !v.is_empty()) {
        settings.api.base_url = url;
    }
    if let Some(ns) = lookup("DASHBOARD_NAMESPACE").filter(|v| !v.is_empty()) {
        settings.namespace = Some(ns);
    }
    if let Some(token) = lookup("DASHBOARD_TOKEN").filter(|v| !v.is_empty()) {
        settings.api.token = Some(token);
    }
}
