//! Tolk Domain - Core session types
//!
//! This crate defines the domain model for the Tolk session coordinator.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod request;
pub mod response;
pub mod routing;
pub mod session;

pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, HttpMethod};
pub use response::{ApiResponse, StatusCode};
pub use routing::{AuthorizationDecision, RoutePaths, decide};
pub use session::{Epoch, Identity, RenewalFailure, RenewalOutcome, Role, SessionState};
