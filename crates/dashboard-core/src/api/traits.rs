//! Secret API trait and errors

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Secret;

/// Errors returned by a secret API
#[derive(Error, Debug)]
pub enum SecretApiError {
    /// Network/HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body is not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Secret already exists: {0}")]
    Conflict(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl SecretApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

pub type SecretApiResult<T> = Result<T, SecretApiError>;

/// Network CRUD for cloud-provider secrets
///
/// Every call returns what the backend answered, including server-assigned
/// fields. `delete_secret` echoes the deleted secret so callers can key the
/// removal on it.
#[async_trait]
pub trait SecretApi: Send + Sync {
    /// List all secrets in a namespace, in backend order
    async fn list_secrets(&self, namespace: &str) -> SecretApiResult<Vec<Secret>>;

    async fn create_secret(&self, namespace: &str, data: &Secret) -> SecretApiResult<Secret>;

    async fn update_secret(&self, namespace: &str, name: &str, data: &Secret) -> SecretApiResult<Secret>;

    async fn delete_secret(&self, namespace: &str, name: &str) -> SecretApiResult<Secret>;
}

/// Type alias for an Arc-wrapped API
pub type SharedSecretApi = Arc<dyn SecretApi>;
