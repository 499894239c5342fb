//! The provider seam repositories call through.

use crate::{BackendResult, ResourceRequest};
use async_trait::async_trait;
use serde_json::Value;

/// A backend answer.
///
/// `resource` is the parsed JSON body, absent for empty bodies.
/// `error_messages` carries backend-reported problems that arrived with a
/// success status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    pub resource: Option<Value>,
    pub error_messages: Vec<String>,
}

impl Resource {
    pub fn new(resource: Value) -> Self {
        Self {
            resource: Some(resource),
            error_messages: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a resource from a decoded body, lifting `errors[].message`.
    pub fn from_body(body: Value) -> Self {
        let error_messages = error_messages_from(&body);
        Self {
            resource: Some(body),
            error_messages,
        }
    }
}

/// Collect `errors[].message` strings from a backend error document.
pub(crate) fn error_messages_from(body: &Value) -> Vec<String> {
    body.get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| error.get("message").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Retrieves and creates backend resources.
///
/// Implementations must be usable from many connections concurrently and
/// must not retry on their own.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Read a resource (GET).
    async fn retrieve_resource(&self, request: &ResourceRequest) -> BackendResult<Resource>;

    /// Create or act on a resource (POST).
    async fn create_resource(&self, request: &ResourceRequest) -> BackendResult<Resource>;
}
