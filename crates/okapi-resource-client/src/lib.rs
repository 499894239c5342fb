//! Backend access for the SIP2 gateway.
//!
//! Repositories describe each backend call as a [`ResourceRequest`] and hand
//! it to a shared [`ResourceProvider`]. The provider is stateless per call and
//! safe to use from any number of connections at once; it performs no
//! retries.
//!
//! ```text
//! Repository → ResourceRequest → ResourceProvider → Okapi REST API
//! ```

mod error;
mod http;
mod provider;
mod request;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{BackendError, BackendResult};
pub use http::HttpResourceProvider;
pub use provider::{Resource, ResourceProvider};
pub use request::{encode_query, AuthContext, HttpMethod, ResourceRequest};
