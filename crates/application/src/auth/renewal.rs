//! Single-flight credential renewal.
//!
//! At most one renewal call is on the wire at any time. Callers that arrive
//! while it is outstanding get a clone of the same shared future and observe
//! the same `Arc<RenewalOutcome>`.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tolk_domain::{ApiRequest, RenewalFailure, RenewalOutcome};

use crate::api;
use crate::ports::HttpClient;

/// A pending renewal; awaiting it yields the shared outcome.
pub type RenewalHandle = Shared<BoxFuture<'static, Arc<RenewalOutcome>>>;

#[derive(Default)]
struct Slot {
    outstanding: Option<(u64, RenewalHandle)>,
    attempts: u64,
}

/// Renews the session credential with single-flight semantics.
pub struct RenewalCoordinator {
    client: Arc<dyn HttpClient>,
    request: ApiRequest,
    timeout: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl RenewalCoordinator {
    /// Creates a coordinator that calls the renewal endpoint through `client`,
    /// giving up after `timeout`.
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self {
            client,
            request: api::refresh(),
            timeout,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Returns the outstanding renewal, starting one if none is in flight.
    ///
    /// The check and the registration of a new attempt happen under one lock
    /// and before anything is awaited.
    #[must_use]
    pub fn renew(&self) -> RenewalHandle {
        let mut slot = self.slot.lock();
        if let Some((_, handle)) = &slot.outstanding {
            return handle.clone();
        }

        slot.attempts += 1;
        let attempt = slot.attempts;
        tracing::debug!(attempt, "starting credential renewal");

        let handle = Self::attempt(
            Arc::clone(&self.client),
            self.request.clone(),
            self.timeout,
            Arc::clone(&self.slot),
            attempt,
        )
        .boxed()
        .shared();
        slot.outstanding = Some((attempt, handle.clone()));
        handle
    }

    /// Returns true while a renewal is in flight.
    #[must_use]
    pub fn is_outstanding(&self) -> bool {
        self.slot.lock().outstanding.is_some()
    }

    /// Returns how many renewal attempts have been started.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.slot.lock().attempts
    }

    /// Returns the renewal timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(
        client: Arc<dyn HttpClient>,
        request: ApiRequest,
        timeout: Duration,
        slot: Arc<Mutex<Slot>>,
        attempt: u64,
    ) -> Arc<RenewalOutcome> {
        let outcome = match tokio::time::timeout(timeout, client.execute(&request)).await {
            Ok(Ok(response)) if response.is_success() => RenewalOutcome::Renewed,
            Ok(Ok(response)) => RenewalOutcome::Failed(RenewalFailure::Rejected {
                status: response.status.as_u16(),
            }),
            Ok(Err(error)) => RenewalOutcome::Failed(RenewalFailure::Transport {
                message: error.to_string(),
            }),
            Err(_) => RenewalOutcome::Failed(RenewalFailure::TimedOut),
        };

        // Release the slot before any caller sees the outcome.
        {
            let mut slot = slot.lock();
            if slot
                .outstanding
                .as_ref()
                .is_some_and(|(current, _)| *current == attempt)
            {
                slot.outstanding = None;
            }
        }

        match &outcome {
            RenewalOutcome::Renewed => tracing::debug!(attempt, "credential renewed"),
            RenewalOutcome::Failed(reason) => {
                tracing::warn!(attempt, %reason, "credential renewal failed");
            }
        }
        Arc::new(outcome)
    }
}

impl std::fmt::Debug for RenewalCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewalCoordinator")
            .field("timeout", &self.timeout)
            .field("outstanding", &self.is_outstanding())
            .field("attempts", &self.attempts())
            .finish_non_exhaustive()
    }
}
