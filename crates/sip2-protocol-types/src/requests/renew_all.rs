//! Renew All (`65`) request.

use crate::grammar::{
    convert_field_to_boolean, parse_date_time, parse_field_identifier,
    parse_variable_length_field, Cursor, WireFormat,
};
use crate::{Field, ParseError, ParseResult};
use chrono::{DateTime, FixedOffset};
use tracing::{debug, warn};

/// Attributes collected while parsing a Renew All message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenewAllFields {
    pub transaction_date: Option<DateTime<FixedOffset>>,
    pub institution_id: Option<String>,
    pub patron_identifier: Option<String>,
    pub patron_password: Option<String>,
    pub terminal_password: Option<String>,
    pub fee_acknowledged: Option<bool>,
}

/// A validated Renew All request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewAllRequest {
    transaction_date: DateTime<FixedOffset>,
    institution_id: String,
    patron_identifier: String,
    patron_password: Option<String>,
    terminal_password: Option<String>,
    fee_acknowledged: Option<bool>,
}

impl RenewAllRequest {
    /// Build a request, failing on the first missing required attribute.
    pub fn new(fields: RenewAllFields) -> ParseResult<Self> {
        Ok(Self {
            transaction_date: fields
                .transaction_date
                .ok_or(ParseError::MissingField("transaction date"))?,
            institution_id: fields
                .institution_id
                .ok_or(ParseError::MissingField("institution id"))?,
            patron_identifier: fields
                .patron_identifier
                .ok_or(ParseError::MissingField("patron identifier"))?,
            patron_password: fields.patron_password,
            terminal_password: fields.terminal_password,
            fee_acknowledged: fields.fee_acknowledged,
        })
    }

    /// Parse the body of a Renew All message (command code already removed).
    pub fn parse(message: &str, format: &WireFormat) -> ParseResult<Self> {
        let mut fields = RenewAllFields::default();

        // transaction date: 18-char, fixed-length required field
        let (transaction_date, mut cursor) =
            parse_date_time(Cursor::new(message), format.timezone)?;
        fields.transaction_date = Some(transaction_date);

        while !cursor.is_at_end() {
            let (field, next) = parse_field_identifier(cursor)?;
            let (value, next) = parse_variable_length_field(next, &field, format.field_delimiter)?;
            cursor = next;

            match field {
                Field::InstitutionId => fields.institution_id = Some(value.to_string()),
                Field::PatronIdentifier => fields.patron_identifier = Some(value.to_string()),
                Field::PatronPassword => fields.patron_password = Some(value.to_string()),
                Field::TerminalPassword => fields.terminal_password = Some(value.to_string()),
                Field::FeeAcknowledged => {
                    fields.fee_acknowledged = Some(convert_field_to_boolean(value)?)
                }
                other if other.is_unknown() => warn!(field = %other, "Unknown Renew All field"),
                other => debug!(field = %other, "Ignoring field not used by Renew All"),
            }
        }

        Self::new(fields)
    }

    pub fn transaction_date(&self) -> DateTime<FixedOffset> {
        self.transaction_date
    }

    pub fn institution_id(&self) -> &str {
        &self.institution_id
    }

    pub fn patron_identifier(&self) -> &str {
        &self.patron_identifier
    }

    pub fn patron_password(&self) -> Option<&str> {
        self.patron_password.as_deref()
    }

    pub fn terminal_password(&self) -> Option<&str> {
        self.terminal_password.as_deref()
    }

    pub fn fee_acknowledged(&self) -> Option<bool> {
        self.fee_acknowledged
    }
}
