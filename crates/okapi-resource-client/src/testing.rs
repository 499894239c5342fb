//! Scripted provider for tests in this and downstream crates.

use crate::{BackendError, BackendResult, HttpMethod, Resource, ResourceProvider, ResourceRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Canned reply for a route.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Empty,
    Status { status: u16, message: String },
}

#[derive(Debug)]
struct Route {
    method: HttpMethod,
    path_prefix: String,
    reply: Reply,
}

/// Answers requests from a route table and records every request it sees.
///
/// Routes match on method and path prefix; the first match wins. Unmatched
/// requests fail with a 404 status.
#[derive(Debug, Default)]
pub struct RecordingResourceProvider {
    routes: Vec<Route>,
    requests: Mutex<Vec<ResourceRequest>>,
    call_count: AtomicUsize,
}

impl RecordingResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: HttpMethod, path_prefix: &str, reply: Reply) -> Self {
        self.routes.push(Route {
            method,
            path_prefix: path_prefix.to_string(),
            reply,
        });
        self
    }

    pub fn on_get(self, path_prefix: &str, body: Value) -> Self {
        self.route(HttpMethod::Get, path_prefix, Reply::Json(body))
    }

    pub fn on_post(self, path_prefix: &str, body: Value) -> Self {
        self.route(HttpMethod::Post, path_prefix, Reply::Json(body))
    }

    pub fn fail_get(self, path_prefix: &str, status: u16, message: &str) -> Self {
        self.route(
            HttpMethod::Get,
            path_prefix,
            Reply::Status {
                status,
                message: message.to_string(),
            },
        )
    }

    pub fn fail_post(self, path_prefix: &str, status: u16, message: &str) -> Self {
        self.route(
            HttpMethod::Post,
            path_prefix,
            Reply::Status {
                status,
                message: message.to_string(),
            },
        )
    }

    /// All recorded requests, in arrival order.
    pub fn requests(&self) -> Vec<ResourceRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Recorded requests with the given method whose path starts with `prefix`.
    pub fn requests_to(&self, method: HttpMethod, prefix: &str) -> Vec<ResourceRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method() == method && request.path().starts_with(prefix))
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn answer(&self, request: &ResourceRequest) -> BackendResult<Resource> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let route = self.routes.iter().find(|route| {
            route.method == request.method() && request.path().starts_with(&route.path_prefix)
        });

        match route.map(|route| &route.reply) {
            Some(Reply::Json(body)) => Ok(Resource::from_body(body.clone())),
            Some(Reply::Empty) => Ok(Resource::empty()),
            Some(Reply::Status { status, message }) => Err(BackendError::Status {
                status: *status,
                message: message.clone(),
            }),
            None => Err(BackendError::Status {
                status: 404,
                message: format!("No route for {}", request.path()),
            }),
        }
    }
}

#[async_trait]
impl ResourceProvider for RecordingResourceProvider {
    async fn retrieve_resource(&self, request: &ResourceRequest) -> BackendResult<Resource> {
        self.answer(request)
    }

    async fn create_resource(&self, request: &ResourceRequest) -> BackendResult<Resource> {
        self.answer(request)
    }
}
