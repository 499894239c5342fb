//! Per-connection session state.

use crate::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use okapi_resource_client::AuthContext;
use sip2_protocol_types::WireFormat;
use std::sync::Arc;

/// State owned by a single terminal connection.
///
/// The connection task owns it and hands handlers a clone, so it is never
/// shared between connections and needs no locking.
#[derive(Clone)]
pub struct SessionData {
    pub tenant: String,
    /// Institution of the most recent request, or the configured default.
    pub institution_id: Option<String>,
    /// Service point the terminal belongs to.
    pub sc_location: Option<String>,
    pub timezone: Tz,
    pub field_delimiter: char,
    pub error_detection_enabled: bool,
    pub username: Option<String>,
    pub token: Option<String>,
    /// Last framed response, replayed on `97`.
    pub last_response: Option<String>,
    clock: Arc<dyn Clock>,
}

impl SessionData {
    pub fn new(tenant: impl Into<String>, timezone: Tz, field_delimiter: char) -> Self {
        Self {
            tenant: tenant.into(),
            institution_id: None,
            sc_location: None,
            timezone,
            field_delimiter,
            error_detection_enabled: false,
            username: None,
            token: None,
            last_response: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock, mostly for tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn wire_format(&self) -> WireFormat {
        WireFormat::new(self.field_delimiter, self.timezone)
    }

    /// Credentials for backend calls made on behalf of this session.
    pub fn auth(&self) -> AuthContext {
        AuthContext::new(self.tenant.clone(), self.token.clone())
    }
}

impl std::fmt::Debug for SessionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionData")
            .field("tenant", &self.tenant)
            .field("institution_id", &self.institution_id)
            .field("sc_location", &self.sc_location)
            .field("timezone", &self.timezone)
            .field("error_detection_enabled", &self.error_detection_enabled)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
