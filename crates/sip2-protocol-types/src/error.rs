//! Wire parsing error types.

use crate::Field;
use thiserror::Error;

/// Error raised while decoding a SIP2 message.
///
/// Every variant is recoverable at the connection level: the server answers
/// with a request-SC-resend message instead of dropping the terminal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer characters remained than a fixed-width field needs.
    #[error("Truncated field: expected {expected} characters, {remaining} remaining")]
    Truncated { expected: usize, remaining: usize },

    /// A variable-length field ran to the end of the message without a delimiter.
    #[error("Missing delimiter after field {0}")]
    MissingDelimiter(Field),

    /// The 18-character date/time field could not be interpreted.
    #[error("Invalid date/time: {0:?}")]
    InvalidDateTime(String),

    /// A flag field held something other than Y/N.
    #[error("Invalid boolean flag: {0:?}")]
    InvalidBoolean(String),

    /// A fixed-width coded field held an unsupported value.
    #[error("Invalid {name}: {value:?}")]
    InvalidFixedField { name: &'static str, value: String },

    /// A required attribute was never supplied.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The two-character command code is not part of the protocol.
    #[error("Unknown command code: {0:?}")]
    UnknownCommand(String),

    /// The AZ checksum does not match the message contents.
    #[error("Checksum mismatch: expected {expected}, received {received}")]
    ChecksumMismatch { expected: String, received: String },
}

/// Result type alias using ParseError.
pub type ParseResult<T> = Result<T, ParseError>;
