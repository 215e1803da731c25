//! Session coordination.
//!
//! This module provides:
//! - The credential store with epoch-gated writes and observers
//! - Single-flight credential renewal
//! - The request gateway that recovers from an expired credential once
//! - The session manager and the route guard built on top of them

mod credential_store;
mod gateway;
mod guard;
mod manager;
mod renewal;

pub use credential_store::{CredentialStore, Subscription};
pub use gateway::{RequestGateway, SessionTerminationHandler};
pub use guard::AuthorizationGuard;
pub use manager::SessionManager;
pub use renewal::{RenewalCoordinator, RenewalHandle};
