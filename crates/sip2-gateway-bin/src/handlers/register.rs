//! Handler registration for the SIP2 server.

use crate::app::GatewayState;
use crate::handlers::{fee_paid, renew_all, resend};
use sip2_server::Sip2Server;
use tracing::info;

/// Register all command handlers.
pub async fn register_handlers(server: &Sip2Server, state: GatewayState) {
    fee_paid::register(server, state.clone()).await;
    renew_all::register(server, state).await;
    resend::register(server).await;

    info!("All SIP2 handlers registered");
}
