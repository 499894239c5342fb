//! Gateway state shared by all connections.

use okapi_resource_client::ResourceProvider;
use sip2_config_and_utils::{Config, CoreResult};
use sip2_repositories::{
    CirculationRepository, FeeFinesRepository, PaymentSettings, SessionData, UsersRepository,
};
use std::sync::Arc;

/// Shared gateway state (thread-safe).
///
/// Repositories hold the shared backend provider; everything per-terminal
/// lives in [`SessionData`].
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub fee_fines: Arc<FeeFinesRepository>,
    pub circulation: Arc<CirculationRepository>,
}

impl GatewayState {
    pub fn new(config: Config, provider: Arc<dyn ResourceProvider>) -> Self {
        let users = UsersRepository::new(provider.clone(), config.patron_identifier_fields.clone());
        let settings = PaymentSettings {
            payment_method: config.payment_method.clone(),
            notify_patron: config.notify_patron,
            rounding: config.money_rounding,
        };

        Self {
            fee_fines: Arc::new(FeeFinesRepository::new(
                provider.clone(),
                users.clone(),
                settings,
            )),
            circulation: Arc::new(CirculationRepository::new(provider, users)),
            config: Arc::new(config),
        }
    }

    /// The session every new connection starts from.
    pub fn session_template(&self) -> CoreResult<SessionData> {
        let config = &self.config;
        let mut session = SessionData::new(
            config.tenant.clone(),
            config.timezone()?,
            config.field_delimiter()?,
        );
        session.institution_id = config.institution_id.clone();
        session.sc_location = config.sc_location.clone();
        session.error_detection_enabled = config.error_detection_enabled;
        session.token = config.okapi_token.clone();
        Ok(session)
    }
}
