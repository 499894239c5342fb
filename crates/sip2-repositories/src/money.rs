//! Monetary amounts.
//!
//! Amounts travel as JSON numbers or wire text and are converted to
//! [`Decimal`] through their decimal text, never through `f64` arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sip2_config_and_utils::MoneyRounding;
use std::str::FromStr;

/// Round half-up under `policy`.
pub fn round(amount: Decimal, policy: MoneyRounding) -> Decimal {
    match policy {
        MoneyRounding::DecimalPlaces(places) => {
            amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
        }
        MoneyRounding::SignificantDigits(digits) => amount
            .round_sf_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero)
            .unwrap_or(amount),
    }
}

/// Parse a wire amount such as `"66.67"`.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    Decimal::from_str(text.trim()).ok()
}

/// Convert a JSON number or numeric string.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .or_else(|_| Decimal::from_scientific(&number.to_string()))
            .ok(),
        Value::String(text) => parse_amount(text),
        _ => None,
    }
}

/// Serde adapter for required amounts.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    decimal_from_json(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {}", value)))
}

/// Serde adapter for optional amounts; unparseable values become `None`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_from_json))
}
