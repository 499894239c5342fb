//! Gateway initialization.

use crate::app::GatewayState;
use crate::handlers::register_handlers;
use okapi_resource_client::HttpResourceProvider;
use sip2_config_and_utils::Config;
use sip2_server::Sip2Server;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Run the gateway until interrupted.
pub async fn run_gateway(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting SIP2 gateway");
    info!(
        okapi_url = %config.okapi_url,
        tenant = %config.tenant,
        port = config.port,
        error_detection = config.error_detection_enabled,
        "Configuration loaded"
    );

    let provider = HttpResourceProvider::new(
        config.okapi_url()?.as_str(),
        Duration::from_millis(config.request_timeout_ms),
    )?;
    let address = format!("0.0.0.0:{}", config.port);
    let message_delimiter = config.message_delimiter()?;

    let state = GatewayState::new(config, Arc::new(provider));
    let server = Sip2Server::new(address, message_delimiter, state.session_template()?)?;

    register_handlers(&server, state).await;

    let shutdown_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                shutdown_server.shutdown();
            }
            Err(e) => error!(error = %e, "Failed to listen for interrupt"),
        }
    });

    let server_result = server.run().await;

    info!("SIP2 gateway stopped");

    server_result.map_err(|e| e.into())
}
