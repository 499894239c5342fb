//! Configuration management for the gateway.

use crate::{CoreError, CoreResult, Paths};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default SIP2 listener port.
pub const DEFAULT_PORT: u16 = 6443;

const DEFAULT_OKAPI_URL: &str = "http://localhost:9130";
const DEFAULT_TENANT: &str = "diku";
const DEFAULT_PAYMENT_METHOD: &str = "Credit Card";
const REDACTED: &str = "<redacted>";
const KNOWN_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// How monetary amounts are rounded before they are compared.
///
/// `SignificantDigits(2)` matches the legacy gateway, which rounds 123.45 to
/// 120; `DecimalPlaces(2)` keeps cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyRounding {
    DecimalPlaces(u32),
    SignificantDigits(u32),
}

impl Default for MoneyRounding {
    fn default() -> Self {
        Self::DecimalPlaces(2)
    }
}

/// Main gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log line format.
    pub log_format: LogFormat,
    /// TCP port terminals connect to.
    pub port: u16,
    /// Base URL of the Okapi gateway.
    pub okapi_url: String,
    /// Tenant all backend calls are made for.
    pub tenant: String,
    /// Static Okapi token, when the deployment does not log terminals in.
    pub okapi_token: Option<String>,
    /// Institution id used until a terminal sends its own.
    pub institution_id: Option<String>,
    /// Service point id sent with payments.
    pub sc_location: Option<String>,
    /// IANA timezone for wire dates without a zone.
    pub timezone: String,
    /// Variable-length field terminator.
    pub field_delimiter: String,
    /// Message terminator.
    pub message_delimiter: String,
    /// Append and verify `AY`/`AZ` error detection.
    pub error_detection_enabled: bool,
    /// Backend request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// User attributes a patron identifier is matched against.
    pub patron_identifier_fields: Vec<String>,
    /// Payment method recorded with fee payments.
    pub payment_method: String,
    /// Ask the backend to notify the patron about payments.
    pub notify_patron: bool,
    /// Rounding applied to paid and owed amounts.
    pub money_rounding: MoneyRounding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::default(),
            port: DEFAULT_PORT,
            okapi_url: DEFAULT_OKAPI_URL.to_string(),
            tenant: DEFAULT_TENANT.to_string(),
            okapi_token: None,
            institution_id: None,
            sc_location: None,
            timezone: "UTC".to_string(),
            field_delimiter: "|".to_string(),
            message_delimiter: "\r".to_string(),
            error_detection_enabled: false,
            request_timeout_ms: 30_000,
            patron_identifier_fields: vec!["barcode".to_string()],
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            notify_patron: true,
            money_rounding: MoneyRounding::default(),
        }
    }
}

impl Config {
    /// Load configuration from `paths`, falling back to defaults, then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Copy safe to print: the Okapi token is masked.
    pub fn redacted(&self) -> Self {
        Self {
            okapi_token: self.okapi_token.as_ref().map(|_| REDACTED.to_string()),
            ..self.clone()
        }
    }

    /// Override settings from `SIP2_*` variables resolved through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("SIP2_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(port) = lookup("SIP2_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(port = %port, "Ignoring invalid SIP2_PORT"),
            }
        }
        if let Some(url) = lookup("SIP2_OKAPI_URL") {
            self.okapi_url = url;
        }
        if let Some(tenant) = lookup("SIP2_TENANT") {
            self.tenant = tenant;
        }
        if let Some(token) = lookup("SIP2_OKAPI_TOKEN") {
            self.okapi_token = Some(token);
        }
    }

    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if !KNOWN_LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(CoreError::Config(format!(
                "Unknown log level: {}",
                self.log_level
            )));
        }
        if self.port == 0 {
            return Err(CoreError::Config("Port must not be 0".to_string()));
        }
        if self.tenant.trim().is_empty() {
            return Err(CoreError::Config("Tenant must not be empty".to_string()));
        }
        if self.patron_identifier_fields.is_empty() {
            return Err(CoreError::Config(
                "At least one patron identifier field is required".to_string(),
            ));
        }
        self.okapi_url()?;
        self.timezone()?;
        let field_delimiter = self.field_delimiter()?;
        let message_delimiter = self.message_delimiter()?;
        if field_delimiter == message_delimiter {
            return Err(CoreError::Config(
                "Field and message delimiters must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the Okapi URL as a parsed URL.
    pub fn okapi_url(&self) -> CoreResult<Url> {
        Url::parse(&self.okapi_url).map_err(CoreError::from)
    }

    pub fn timezone(&self) -> CoreResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| CoreError::Config(format!("Unknown timezone: {}", self.timezone)))
    }

    pub fn field_delimiter(&self) -> CoreResult<char> {
        single_char("field_delimiter", &self.field_delimiter)
    }

    pub fn message_delimiter(&self) -> CoreResult<char> {
        single_char("message_delimiter", &self.message_delimiter)
    }
}

fn single_char(name: &str, value: &str) -> CoreResult<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(CoreError::Config(format!(
            "{} must be exactly one character, got {:?}",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.field_delimiter().unwrap(), '|');
        assert_eq!(config.message_delimiter().unwrap(), '\r');
        assert_eq!(config.timezone().unwrap(), Tz::UTC);
        assert_eq!(config.money_rounding, MoneyRounding::DecimalPlaces(2));
    }

    #[test]
    fn load_from_file_with_partial_fields() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let config_json = r#"{
            "log_level": "debug",
            "timezone": "America/Chicago",
            "money_rounding": { "significant_digits": 2 }
        }"#;
        std::fs::write(&config_path, config_json).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.timezone().unwrap(), chrono_tz::America::Chicago);
        assert_eq!(config.money_rounding, MoneyRounding::SignificantDigits(2));
        assert_eq!(config.tenant, DEFAULT_TENANT);
    }

    #[test]
    fn load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("missing"));

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.okapi_url, DEFAULT_OKAPI_URL);
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SIP2_LOG_LEVEL", "trace"),
            ("SIP2_PORT", "7001"),
            ("SIP2_TENANT", "fs00001"),
            ("SIP2_OKAPI_TOKEN", "token"),
        ]);

        let mut config = Config::default();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.log_level, "trace");
        assert_eq!(config.port, 7001);
        assert_eq!(config.tenant, "fs00001");
        assert_eq!(config.okapi_token.as_deref(), Some("token"));
    }

    #[test]
    fn redacted_masks_token_only() {
        let mut config = Config::default();
        config.okapi_token = Some("secret-token".to_string());
        config.port = 7002;

        let redacted = config.redacted();
        assert_eq!(redacted.okapi_token.as_deref(), Some(REDACTED));
        assert_eq!(redacted.port, 7002);
        assert!(!serde_json::to_string(&redacted).unwrap().contains("secret-token"));

        assert_eq!(Config::default().redacted().okapi_token, None);
    }

    #[test]
    fn invalid_port_env_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|name| (name == "SIP2_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.field_delimiter = "||".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.message_delimiter = "|".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.okapi_url = "not a valid url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
