//! Tolk Application - Session coordination and ports
//!
//! This crate defines the application layer with:
//! - Port traits (transport and navigation)
//! - The session coordinator: store, renewal, gateway, manager, guard
//! - Request descriptors for the session REST surface
//! - Application-level error handling

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod ports;

#[cfg(test)]
mod testing;

pub use api::{Credentials, Registration, RoleAssignment};
pub use auth::{
    AuthorizationGuard, CredentialStore, RenewalCoordinator, RenewalHandle, RequestGateway,
    SessionManager, SessionTerminationHandler, Subscription,
};
pub use config::SessionConfig;
pub use error::{ApiError, ApiResult, SessionError, SessionResult};
pub use ports::{HttpClient, HttpClientError, Navigator};
