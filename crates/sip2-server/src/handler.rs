//! What handlers receive and return.

use sip2_protocol_types::{Command, REQUEST_SC_RESEND};
use sip2_repositories::SessionData;
use std::future::Future;
use std::pin::Pin;

/// Handler function type for SIP2 commands.
pub type HandlerFn =
    Box<dyn Fn(HandlerRequest) -> Pin<Box<dyn Future<Output = Reply> + Send>> + Send + Sync>;

/// One inbound message, already stripped of framing and error detection.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub command: Command,
    /// Everything after the two-character command code.
    pub body: String,
    /// Snapshot of the connection's session.
    pub session: SessionData,
}

/// A handler's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    message: Option<String>,
    institution_id: Option<String>,
}

impl Reply {
    /// Send `message` to the terminal.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            institution_id: None,
        }
    }

    /// Ask the terminal to send its message again.
    pub fn resend() -> Self {
        Self {
            message: None,
            institution_id: None,
        }
    }

    /// Remember the institution the terminal identified itself with.
    pub fn with_institution_id(mut self, institution_id: impl Into<String>) -> Self {
        self.institution_id = Some(institution_id.into());
        self
    }

    pub fn is_resend(&self) -> bool {
        self.message.is_none()
    }

    pub fn institution_id(&self) -> Option<&str> {
        self.institution_id.as_deref()
    }

    /// The wire message, `96` for a resend request.
    pub fn into_message(self) -> String {
        self.message.unwrap_or_else(|| REQUEST_SC_RESEND.to_string())
    }
}
