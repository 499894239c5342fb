//! SIP2 command handlers.
//!
//! Each module parses its request, runs the repository workflow and encodes
//! the response. A message that does not parse is answered with `96`.

mod fee_paid;
mod register;
mod renew_all;
mod resend;

pub use register::register_handlers;
