//! Backend workflows for the SIP2 gateway.
//!
//! Each repository turns one validated request into a response by issuing a
//! strictly sequential chain of backend calls through a shared
//! [`okapi_resource_client::ResourceProvider`]. Backend failures never escape
//! as errors; they become negative responses.

mod circulation;
mod clock;
mod fee_fines;
pub mod models;
pub mod money;
mod session;
mod users;

pub use circulation::CirculationRepository;
pub use clock::{Clock, FixedClock, SystemClock};
pub use fee_fines::{FeeFinesRepository, PaymentSettings};
pub use session::SessionData;
pub use users::UsersRepository;
