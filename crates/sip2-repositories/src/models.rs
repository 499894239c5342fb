//! Backend records the workflows read.

use crate::money;
use okapi_resource_client::Resource;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub personal: Option<Personal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personal {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A monetary obligation owed by a patron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub fee_fine_id: Option<String>,
    #[serde(default, deserialize_with = "money::deserialize_option")]
    pub amount: Option<Decimal>,
    #[serde(deserialize_with = "money::deserialize")]
    pub remaining: Decimal,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
    /// Filled in from the matching fee/fine record, when there is one.
    #[serde(default)]
    pub fee_fine_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    pub name: String,
}

/// A fee/fine type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeFine {
    pub id: String,
    #[serde(default)]
    pub fee_fine_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualBlock {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub patron_message: Option<String>,
    #[serde(default)]
    pub borrowing: bool,
    #[serde(default)]
    pub renewals: bool,
    #[serde(default)]
    pub requests: bool,
    #[serde(default)]
    pub expiration_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub item_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub item: Option<LoanItem>,
}

impl Loan {
    /// What the terminal knows the item by: its barcode, else its id.
    pub fn item_identifier(&self) -> &str {
        self.item
            .as_ref()
            .and_then(|item| item.barcode.as_deref())
            .unwrap_or(&self.item_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanItem {
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Decode the array under `key` of a backend collection document.
pub(crate) fn collection<T: DeserializeOwned>(resource: &Resource, key: &str) -> Option<Vec<T>> {
    let items = resource.resource.as_ref()?.get(key)?.clone();
    match serde_json::from_value(items) {
        Ok(items) => Some(items),
        Err(e) => {
            warn!(key, error = %e, "Malformed backend collection");
            None
        }
    }
}
