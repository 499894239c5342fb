//! Two-character SIP2 field identifiers.

use std::fmt;

/// Variable-length field identifiers.
///
/// The meaning of a code is fixed by the protocol, but each command only
/// accepts a subset. Codes outside this set are kept as [`Field::Unknown`] so
/// the parser can log and skip them without losing cursor alignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// AA: patron identifier.
    PatronIdentifier,
    /// AB: item identifier.
    ItemIdentifier,
    /// AC: terminal password.
    TerminalPassword,
    /// AD: patron password.
    PatronPassword,
    /// AF: screen message.
    ScreenMessage,
    /// AG: print line.
    PrintLine,
    /// AO: institution id.
    InstitutionId,
    /// AY: sequence number (error detection).
    SequenceNumber,
    /// AZ: checksum (error detection).
    Checksum,
    /// BK: transaction id.
    TransactionId,
    /// BM: renewed items.
    RenewedItems,
    /// BN: unrenewed items.
    UnrenewedItems,
    /// BO: fee acknowledged.
    FeeAcknowledged,
    /// BV: fee amount.
    FeeAmount,
    /// CG: fee identifier.
    FeeIdentifier,
    /// CP: location code.
    LocationCode,
    /// Any code this gateway does not know.
    Unknown(String),
}

impl Field {
    /// Map a two-character wire code to a field.
    pub fn from_code(code: &str) -> Self {
        match code {
            "AA" => Self::PatronIdentifier,
            "AB" => Self::ItemIdentifier,
            "AC" => Self::TerminalPassword,
            "AD" => Self::PatronPassword,
            "AF" => Self::ScreenMessage,
            "AG" => Self::PrintLine,
            "AO" => Self::InstitutionId,
            "AY" => Self::SequenceNumber,
            "AZ" => Self::Checksum,
            "BK" => Self::TransactionId,
            "BM" => Self::RenewedItems,
            "BN" => Self::UnrenewedItems,
            "BO" => Self::FeeAcknowledged,
            "BV" => Self::FeeAmount,
            "CG" => Self::FeeIdentifier,
            "CP" => Self::LocationCode,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The wire code for this field.
    pub fn code(&self) -> &str {
        match self {
            Self::PatronIdentifier => "AA",
            Self::ItemIdentifier => "AB",
            Self::TerminalPassword => "AC",
            Self::PatronPassword => "AD",
            Self::ScreenMessage => "AF",
            Self::PrintLine => "AG",
            Self::InstitutionId => "AO",
            Self::SequenceNumber => "AY",
            Self::Checksum => "AZ",
            Self::TransactionId => "BK",
            Self::RenewedItems => "BM",
            Self::UnrenewedItems => "BN",
            Self::FeeAcknowledged => "BO",
            Self::FeeAmount => "BV",
            Self::FeeIdentifier => "CG",
            Self::LocationCode => "CP",
            Self::Unknown(code) => code,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
