//! Application wiring and lifecycle.

mod init;
mod state;

pub use init::run_gateway;
pub use state::GatewayState;
