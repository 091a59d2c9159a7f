//! REST client for the dashboard backend's cloud-provider secret endpoints
//!
//! ```text
//! GET    /api/namespaces/{namespace}/cloudprovidersecrets
//! POST   /api/namespaces/{namespace}/cloudprovidersecrets
//! PUT    /api/namespaces/{namespace}/cloudprovidersecrets/{name}
//! DELETE /api/namespaces/{namespace}/cloudprovidersecrets/{name}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use super::traits::{SecretApi, SecretApiError, SecretApiResult};
use crate::config::ApiSettings;
use crate::logging;
use crate::types::Secret;

const LOG_MODULE: &str = "api::http";

/// HTTP implementation of [`SecretApi`]
#[derive(Clone)]
pub struct HttpSecretApi {
    base_url: Url,
    client: reqwest::Client,
    token: Option<String>,
    timeout: Duration,
}

impl HttpSecretApi {
    /// Build a client for the given backend base URL
    pub fn new(base_url: impl AsRef<str>) -> SecretApiResult<Self> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| SecretApiError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(SecretApiError::InvalidUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("dashboard-core/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url,
            client,
            token: None,
            timeout: Duration::from_secs(10),
        })
    }

    /// Build a client from the `api` section of the settings
    pub fn from_settings(settings: &ApiSettings) -> SecretApiResult<Self> {
        let mut api = Self::new(&settings.base_url)?
            .with_timeout(Duration::from_secs(settings.timeout_secs));
        if let Some(token) = &settings.token {
            api = api.with_token(token.clone());
        }
        Ok(api)
    }

    /// Attach a bearer token sent with each request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the request timeout (default 10 seconds)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the collection, or of one secret when `name` is given
    fn endpoint(&self, namespace: &str, name: Option<&str>) -> SecretApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SecretApiError::InvalidUrl(self.base_url.to_string()))?;
            segments
                .pop_if_empty()
                .extend(["api", "namespaces", namespace, "cloudprovidersecrets"]);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.timeout(self.timeout);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, method: &str, builder: reqwest::RequestBuilder) -> SecretApiResult<reqwest::Response> {
        let request = self.apply_auth(builder);
        let response = request.send().await.map_err(|e| {
            logging::error(LOG_MODULE, &format!("{} failed: {}", method, e));
            SecretApiError::Http(e)
        })?;

        let status = response.status();
        logging::debug(LOG_MODULE, &format!("{} -> {}", method, status));
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = error_for_status(status, &body);
        logging::warn(LOG_MODULE, &format!("{} rejected: {}", method, err));
        Err(err)
    }
}

/// Read a success body and parse it as JSON
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> SecretApiResult<T> {
    let body = response.bytes().await?;
    parse_body(&body)
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> SecretApiResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        logging::warn(LOG_MODULE, &format!("undecodable body: {}", e));
        SecretApiError::Json(e)
    })
}

/// Map a non-success response to an error, preferring the backend's message
fn error_for_status(status: StatusCode, body: &str) -> SecretApiError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    match status {
        StatusCode::NOT_FOUND => SecretApiError::NotFound(message),
        StatusCode::CONFLICT => SecretApiError::Conflict(message),
        _ => SecretApiError::status(status.as_u16(), message),
    }
}

impl std::fmt::Debug for HttpSecretApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSecretApi")
            .field("base_url", &self.base_url.as_str())
            .field("has_token", &self.token.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl SecretApi for HttpSecretApi {
    async fn list_secrets(&self, namespace: &str) -> SecretApiResult<Vec<Secret>> {
        let url = self.endpoint(namespace, None)?;
        let response = self.send("GET", self.client.get(url)).await?;
        decode(response).await
    }

    async fn create_secret(&self, namespace: &str, data: &Secret) -> SecretApiResult<Secret> {
        let url = self.endpoint(namespace, None)?;
        let response = self.send("POST", self.client.post(url).json(data)).await?;
        decode(response).await
    }

    async fn update_secret(&self, namespace: &str, name: &str, data: &Secret) -> SecretApiResult<Secret> {
        let url = self.endpoint(namespace, Some(name))?;
        let response = self.send("PUT", self.client.put(url).json(data)).await?;
        decode(response).await
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> SecretApiResult<Secret> {
        let url = self.endpoint(namespace, Some(name))?;
        let response = self.send("DELETE", self.client.delete(url)).await?;
        decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        let api = HttpSecretApi::new("https://dashboard.example.org").unwrap();
        assert_eq!(
            api.endpoint("garden-dev", None).unwrap().as_str(),
            "https://dashboard.example.org/api/namespaces/garden-dev/cloudprovidersecrets"
        );
        assert_eq!(
            api.endpoint("garden-dev", Some("my-aws")).unwrap().as_str(),
            "https://dashboard.example.org/api/namespaces/garden-dev/cloudprovidersecrets/my-aws"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes() {
        let api = HttpSecretApi::new("https://example.org/dashboard/").unwrap();
        assert_eq!(
            api.endpoint("garden-dev", Some("a b")).unwrap().as_str(),
            "https://example.org/dashboard/api/namespaces/garden-dev/cloudprovidersecrets/a%20b"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpSecretApi::new("not a url"),
            Err(SecretApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpSecretApi::new("mailto:someone@example.org"),
            Err(SecretApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_from_settings() {
        let settings = ApiSettings {
            base_url: "https://dashboard.example.org".to_string(),
            token: Some("t0ken".to_string()),
            timeout_secs: 3,
        };
        let api = HttpSecretApi::from_settings(&settings).unwrap();
        assert_eq!(api.timeout, Duration::from_secs(3));
        assert_eq!(api.token.as_deref(), Some("t0ken"));
        assert!(format!("{:?}", api).contains("has_token: true"));
    }

    #[test]
    fn test_parse_body() {
        let secret: Secret =
            parse_body(br#"{"metadata":{"name":"my-aws","namespace":"garden-dev"}}"#).unwrap();
        assert_eq!(secret.key().to_string(), "garden-dev/my-aws");

        let secrets: Vec<Secret> = parse_body(b"[]").unwrap();
        assert!(secrets.is_empty());

        assert!(matches!(
            parse_body::<Vec<Secret>>(b"<html>gateway timeout</html>"),
            Err(SecretApiError::Json(_))
        ));
        assert!(matches!(
            parse_body::<Secret>(br#"{"kind":"Status"}"#),
            Err(SecretApiError::Json(_))
        ));
    }

    #[test]
    fn test_error_for_status() {
        let err = error_for_status(
            StatusCode::NOT_FOUND,
            r#"{"code":404,"reason":"Not Found","message":"Secret my-aws not found"}"#,
        );
        assert!(matches!(err, SecretApiError::NotFound(ref m) if m == "Secret my-aws not found"));

        let err = error_for_status(StatusCode::CONFLICT, "already exists");
        assert!(matches!(err, SecretApiError::Conflict(ref m) if m == "already exists"));

        let err = error_for_status(StatusCode::FORBIDDEN, "");
        assert!(matches!(
            err,
            SecretApiError::Status { status: 403, ref message } if message == "Forbidden"
        ));
    }
}
