//! Typed SIP2 responses and their encoders.

mod fee_paid;
mod renew_all;

pub use fee_paid::FeePaidResponse;
pub use renew_all::RenewAllResponse;

use crate::grammar::WireFormat;

/// A response that can be written back to the terminal.
///
/// Encoding emits fixed fields at fixed width and variable fields as
/// `<code><value><delimiter>`, in the order the command defines. The
/// error-detection trailer is added by the transport, not here.
pub trait Sip2Response {
    fn encode(&self, format: &WireFormat) -> String;
}
