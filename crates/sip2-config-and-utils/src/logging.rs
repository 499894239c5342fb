//! Logging initialization for the gateway.
//!
//! Services call [`init_logging`] once at startup and use the standard
//! `tracing` macros everywhere else. `RUST_LOG` takes precedence over the
//! configured level.

use crate::LogFormat;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// A second call is a no-op, which keeps tests that bootstrap the server
/// independent of each other.
pub fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let result = match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .finish()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .flatten_event(true)
            .finish()
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        init_logging("debug", LogFormat::Text);
        init_logging("info", LogFormat::Json);
        tracing::info!("logging initialized");
    }
}
