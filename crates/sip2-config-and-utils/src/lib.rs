//! Configuration, paths, errors and logging for the SIP2 gateway.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, LogFormat, MoneyRounding, DEFAULT_LOG_LEVEL, DEFAULT_PORT};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
