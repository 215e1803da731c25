//! Session state, epoch, and renewal outcome types

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::Identity;

/// Who is logged in, as far as the client knows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No identity is held.
    #[default]
    Unauthenticated,
    /// A session restore is in progress.
    Initializing,
    /// An identity is held.
    Authenticated(Arc<Identity>),
}

impl SessionState {
    /// Returns true if an identity is held.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Returns true while a session restore is in progress.
    #[must_use]
    pub const fn is_initializing(&self) -> bool {
        matches!(self, Self::Initializing)
    }

    /// Returns the held identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Arc<Identity>> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// Returns a short label for logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Initializing => "initializing",
            Self::Authenticated(_) => "authenticated",
        }
    }
}

/// Session generation counter.
///
/// Advanced on every login, registration, logout, and forced termination.
/// Asynchronous work captures the epoch when it starts and drops its result
/// if the epoch has moved on by the time it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// Creates an epoch with the given value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the following epoch.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a renewal attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenewalFailure {
    /// The renewal endpoint answered with a non-success status.
    #[error("renewal rejected with status {status}")]
    Rejected {
        /// Status returned by the endpoint.
        status: u16,
    },
    /// No answer arrived within the renewal timeout.
    #[error("renewal timed out")]
    TimedOut,
    /// The request never completed.
    #[error("renewal transport error: {message}")]
    Transport {
        /// Transport error description.
        message: String,
    },
}

/// Result of one renewal attempt, shared by every caller that joined it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalOutcome {
    /// Fresh credentials were issued.
    Renewed,
    /// The credential could not be renewed.
    Failed(RenewalFailure),
}

impl RenewalOutcome {
    /// Returns true if the credential was renewed.
    #[must_use]
    pub const fn is_renewed(&self) -> bool {
        matches!(self, Self::Renewed)
    }
}
