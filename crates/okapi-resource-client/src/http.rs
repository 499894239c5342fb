//! reqwest-backed provider that talks to Okapi.

use crate::provider::error_messages_from;
use crate::{BackendError, BackendResult, HttpMethod, Resource, ResourceProvider, ResourceRequest};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::{debug, error};

const HEADER_TENANT: &str = "X-Okapi-Tenant";
const HEADER_TOKEN: &str = "X-Okapi-Token";

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Okapi REST provider.
#[derive(Clone)]
pub struct HttpResourceProvider {
    http_client: reqwest::Client,
    okapi_url: String,
}

impl HttpResourceProvider {
    /// Create a provider for `okapi_url` with a per-request timeout.
    pub fn new(okapi_url: impl Into<String>, timeout: Duration) -> BackendResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            okapi_url: okapi_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.okapi_url.trim_end_matches('/'), path)
    }

    async fn send(&self, request: &ResourceRequest) -> BackendResult<Resource> {
        let url = self.url(request.path());
        let mut builder = match request.method() {
            HttpMethod::Get => self.http_client.get(&url),
            HttpMethod::Post => self.http_client.post(&url),
        };

        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = builder.header(HEADER_TENANT, request.auth().tenant.as_str());
        if let Some(token) = request.auth().token.as_deref() {
            builder = builder.header(HEADER_TOKEN, token);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        debug!(method = ?request.method(), path = %request.path(), "Sending backend request");

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let body_summary = summarize_response_body(&body);
            error!(
                status = %status,
                path = %request.path(),
                body_summary = %body_summary,
                "Backend request failed"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: failure_message(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Resource::empty());
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        Ok(Resource::from_body(value))
    }
}

/// Prefer the backend's structured messages over the raw body.
fn failure_message(body: &str) -> String {
    let structured = serde_json::from_str::<serde_json::Value>(body)
        .map(|value| error_messages_from(&value))
        .unwrap_or_default();
    if structured.is_empty() {
        body.trim().to_string()
    } else {
        structured.join("; ")
    }
}

#[async_trait]
impl ResourceProvider for HttpResourceProvider {
    async fn retrieve_resource(&self, request: &ResourceRequest) -> BackendResult<Resource> {
        self.send(request).await
    }

    async fn create_resource(&self, request: &ResourceRequest) -> BackendResult<Resource> {
        self.send(request).await
    }
}

impl std::fmt::Debug for HttpResourceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResourceProvider")
            .field("okapi_url", &self.okapi_url)
            .finish_non_exhaustive()
    }
}
