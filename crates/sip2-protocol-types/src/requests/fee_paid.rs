//! Fee Paid (`37`) request.

use crate::grammar::{
    parse_date_time, parse_field_identifier, parse_fixed_length_field,
    parse_variable_length_field, Cursor, WireFormat,
};
use crate::{Field, ParseError, ParseResult};
use chrono::{DateTime, FixedOffset};
use tracing::{debug, warn};

/// Category of the fee being paid (2-char fixed field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeType {
    OtherUnknown,
    Administrative,
    Damage,
    Overdue,
    Processing,
    Rental,
    Replacement,
    ComputerAccessCharge,
    HoldFee,
}

impl FeeType {
    pub fn from_code(code: &str) -> ParseResult<Self> {
        let fee_type = match code {
            "01" => Self::OtherUnknown,
            "02" => Self::Administrative,
            "03" => Self::Damage,
            "04" => Self::Overdue,
            "05" => Self::Processing,
            "06" => Self::Rental,
            "07" => Self::Replacement,
            "08" => Self::ComputerAccessCharge,
            "09" => Self::HoldFee,
            other => {
                return Err(ParseError::InvalidFixedField {
                    name: "fee type",
                    value: other.to_string(),
                })
            }
        };
        Ok(fee_type)
    }
}

/// How the patron paid (2-char fixed field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentType {
    Cash,
    Visa,
    CreditCard,
}

impl PaymentType {
    pub fn from_code(code: &str) -> ParseResult<Self> {
        match code {
            "00" => Ok(Self::Cash),
            "01" => Ok(Self::Visa),
            "02" => Ok(Self::CreditCard),
            other => Err(ParseError::InvalidFixedField {
                name: "payment type",
                value: other.to_string(),
            }),
        }
    }
}

/// ISO 4217 currency code (3-char fixed field).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyType(String);

impl CurrencyType {
    pub fn new(code: &str) -> ParseResult<Self> {
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ParseError::InvalidFixedField {
                name: "currency type",
                value: code.to_string(),
            });
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Attributes collected while parsing a Fee Paid message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeePaidFields {
    pub transaction_date: Option<DateTime<FixedOffset>>,
    pub fee_type: Option<FeeType>,
    pub payment_type: Option<PaymentType>,
    pub currency_type: Option<CurrencyType>,
    pub fee_amount: Option<String>,
    pub institution_id: Option<String>,
    pub patron_identifier: Option<String>,
    pub terminal_password: Option<String>,
    pub patron_password: Option<String>,
    pub fee_identifier: Option<String>,
    pub transaction_id: Option<String>,
}

/// A validated Fee Paid request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeePaidRequest {
    transaction_date: DateTime<FixedOffset>,
    fee_type: FeeType,
    payment_type: PaymentType,
    currency_type: CurrencyType,
    fee_amount: String,
    institution_id: String,
    patron_identifier: String,
    terminal_password: Option<String>,
    patron_password: Option<String>,
    fee_identifier: Option<String>,
    transaction_id: Option<String>,
}

impl FeePaidRequest {
    /// Build a request, failing on the first missing required attribute.
    pub fn new(fields: FeePaidFields) -> ParseResult<Self> {
        let fee_amount = fields
            .fee_amount
            .map(|amount| amount.trim().to_string())
            .filter(|amount| !amount.is_empty())
            .ok_or(ParseError::MissingField("fee amount"))?;

        Ok(Self {
            transaction_date: fields
                .transaction_date
                .ok_or(ParseError::MissingField("transaction date"))?,
            fee_type: fields.fee_type.ok_or(ParseError::MissingField("fee type"))?,
            payment_type: fields
                .payment_type
                .ok_or(ParseError::MissingField("payment type"))?,
            currency_type: fields
                .currency_type
                .ok_or(ParseError::MissingField("currency type"))?,
            fee_amount,
            institution_id: fields
                .institution_id
                .ok_or(ParseError::MissingField("institution id"))?,
            patron_identifier: fields
                .patron_identifier
                .ok_or(ParseError::MissingField("patron identifier"))?,
            terminal_password: fields.terminal_password,
            patron_password: fields.patron_password,
            fee_identifier: fields.fee_identifier,
            transaction_id: fields.transaction_id,
        })
    }

    /// Parse the body of a Fee Paid message (command code already removed).
    pub fn parse(message: &str, format: &WireFormat) -> ParseResult<Self> {
        let mut fields = FeePaidFields::default();

        let (transaction_date, cursor) = parse_date_time(Cursor::new(message), format.timezone)?;
        fields.transaction_date = Some(transaction_date);

        let (fee_type, cursor) = parse_fixed_length_field(cursor, 2)?;
        fields.fee_type = Some(FeeType::from_code(fee_type)?);

        let (payment_type, cursor) = parse_fixed_length_field(cursor, 2)?;
        fields.payment_type = Some(PaymentType::from_code(payment_type)?);

        let (currency_type, mut cursor) = parse_fixed_length_field(cursor, 3)?;
        fields.currency_type = Some(CurrencyType::new(currency_type)?);

        while !cursor.is_at_end() {
            let (field, next) = parse_field_identifier(cursor)?;
            let (value, next) = parse_variable_length_field(next, &field, format.field_delimiter)?;
            cursor = next;

            let value = Some(value.to_string());
            match field {
                Field::FeeAmount => fields.fee_amount = value,
                Field::InstitutionId => fields.institution_id = value,
                Field::PatronIdentifier => fields.patron_identifier = value,
                Field::TerminalPassword => fields.terminal_password = value,
                Field::PatronPassword => fields.patron_password = value,
                Field::FeeIdentifier => fields.fee_identifier = value,
                Field::TransactionId => fields.transaction_id = value,
                other if other.is_unknown() => warn!(field = %other, "Unknown Fee Paid field"),
                other => debug!(field = %other, "Ignoring field not used by Fee Paid"),
            }
        }

        Self::new(fields)
    }

    pub fn transaction_date(&self) -> DateTime<FixedOffset> {
        self.transaction_date
    }

    pub fn fee_type(&self) -> FeeType {
        self.fee_type
    }

    pub fn payment_type(&self) -> PaymentType {
        self.payment_type
    }

    pub fn currency_type(&self) -> &CurrencyType {
        &self.currency_type
    }

    /// Amount as sent by the terminal, surrounding blanks removed.
    pub fn fee_amount(&self) -> &str {
        &self.fee_amount
    }

    pub fn institution_id(&self) -> &str {
        &self.institution_id
    }

    pub fn patron_identifier(&self) -> &str {
        &self.patron_identifier
    }

    pub fn terminal_password(&self) -> Option<&str> {
        self.terminal_password.as_deref()
    }

    pub fn patron_password(&self) -> Option<&str> {
        self.patron_password.as_deref()
    }

    pub fn fee_identifier(&self) -> Option<&str> {
        self.fee_identifier.as_deref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }
}
