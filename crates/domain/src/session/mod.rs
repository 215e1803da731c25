//! Session domain types

mod identity;
mod state;

pub use identity::{Identity, Role};
pub use state::{Epoch, RenewalFailure, RenewalOutcome, SessionState};
