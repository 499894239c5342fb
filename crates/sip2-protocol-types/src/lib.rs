//! Pure SIP2 protocol types for the gateway.
//!
//! This crate contains only data types, the wire grammar and the
//! request/response codecs. There is no I/O and no async here. It defines the
//! shared language between the terminal-facing server and the backend
//! workflows.

pub mod checksum;
mod command;
mod error;
mod field;
pub mod grammar;
pub mod requests;
pub mod responses;

pub use checksum::{append_error_detection, compute_checksum, split_error_detection, ErrorDetection};
pub use command::{Command, REQUEST_SC_RESEND};
pub use error::{ParseError, ParseResult};
pub use field::Field;
pub use grammar::{Cursor, WireFormat};
pub use requests::{
    CurrencyType, FeePaidFields, FeePaidRequest, FeeType, PaymentType, RenewAllFields,
    RenewAllRequest,
};
pub use responses::{FeePaidResponse, RenewAllResponse, Sip2Response};
