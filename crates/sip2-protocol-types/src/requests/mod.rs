//! Typed SIP2 requests and their parsers.
//!
//! Each parser collects raw attributes into a `*Fields` value and hands it to
//! the request's validating constructor, which either yields an immutable
//! request or names the first missing required field.

mod fee_paid;
mod renew_all;

pub use fee_paid::{CurrencyType, FeePaidFields, FeePaidRequest, FeeType, PaymentType};
pub use renew_all::{RenewAllFields, RenewAllRequest};
