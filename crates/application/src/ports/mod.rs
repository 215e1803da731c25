//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session core and the host.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod http_client;
mod navigator;

pub use http_client::{HttpClient, HttpClientError};
pub use navigator::Navigator;
