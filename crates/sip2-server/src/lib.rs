//! SIP2 transport for the gateway.
//!
//! [`Sip2Server`] accepts terminal connections, frames messages on the
//! configured terminator, handles `AY`/`AZ` error detection and hands each
//! message to the handler registered for its command.

mod error;
mod handler;
mod server;

pub use error::{ServerError, ServerResult};
pub use handler::{HandlerFn, HandlerRequest, Reply};
pub use server::{Sip2Server, MAX_FRAME_BYTES};
