//! Cloud-provider secret entity

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Primary key of a secret within a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretKey {
    pub namespace: String,
    pub name: String,
}

impl SecretKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Infrastructure or DNS provider a secret belongs to
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider type (e.g., "aws", "azure", "gcp", "aws-route53")
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Any other provider fields the backend sends along
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProviderInfo {
    pub fn new(provider_type: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            extra: Map::new(),
        }
    }
}

/// Secret metadata
///
/// `name` and `namespace` form the identity. The namespace may be missing on
/// payloads that are about to be created; the store fills it in from the
/// current tenant namespace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderInfo>,

    /// Remaining metadata (secretRef, uid, resourceVersion, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A cloud-provider secret as served by the dashboard API
///
/// Only the metadata needed for identity and classification is typed;
/// everything else (`data`, `quotas`, ...) is carried as free-form JSON.
///
/// # Example
///
/// ```
/// use dashboard_core::types::Secret;
/// use serde_json::json;
///
/// let secret = Secret::new("garden-dev", "aws-credentials")
///     .with_provider_type("aws")
///     .with_field("data", json!({ "accessKeyID": "AKIA..." }));
///
/// assert_eq!(secret.provider_type(), Some("aws"));
/// assert_eq!(secret.key().to_string(), "garden-dev/aws-credentials");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Secret {
    pub metadata: SecretMetadata,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Secret {
    /// Create a secret with a namespace and name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: SecretMetadata {
                name: name.into(),
                namespace: Some(namespace.into()),
                ..Default::default()
            },
            fields: Map::new(),
        }
    }

    /// Create a secret without a namespace (resolved on create/update)
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            metadata: SecretMetadata {
                name: name.into(),
                ..Default::default()
            },
            fields: Map::new(),
        }
    }

    /// Set the provider type
    pub fn with_provider_type(mut self, provider_type: impl Into<String>) -> Self {
        self.metadata.provider = Some(ProviderInfo::new(provider_type));
        self
    }

    /// Set a top-level field
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Set a metadata field
    pub fn with_metadata_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.extra.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }

    /// Provider type, if the secret carries one
    pub fn provider_type(&self) -> Option<&str> {
        self.metadata
            .provider
            .as_ref()
            .map(|p| p.provider_type.as_str())
    }

    /// Identity of this secret; a missing namespace keys as the empty string
    pub fn key(&self) -> SecretKey {
        SecretKey::new(self.namespace().unwrap_or_default(), self.name())
    }

    /// Whether this secret has the given namespace and name
    pub fn matches(&self, namespace: &str, name: &str) -> bool {
        self.metadata.name == name && self.namespace().unwrap_or_default() == namespace
    }

    /// Overlay `newer` onto this secret
    ///
    /// Top-level fields and metadata fields are merged key by key with the
    /// newer value winning. `namespace` and `provider` are only replaced when
    /// `newer` carries them.
    pub fn merge(&mut self, newer: Secret) {
        let Secret { metadata, fields } = newer;

        self.metadata.name = metadata.name;
        if metadata.namespace.is_some() {
            self.metadata.namespace = metadata.namespace;
        }
        if metadata.provider.is_some() {
            self.metadata.provider = metadata.provider;
        }
        self.metadata.extra.extend(metadata.extra);
        self.fields.extend(fields);
    }

    /// Return a copy of this secret with `newer` overlaid
    pub fn merged(&self, newer: Secret) -> Secret {
        let mut merged = self.clone();
        merged.merge(newer);
        merged
    }
}
