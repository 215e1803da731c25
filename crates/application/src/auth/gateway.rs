//! Request execution with transparent credential renewal.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tolk_domain::{ApiRequest, ApiResponse, Epoch};

use super::{CredentialStore, RenewalCoordinator};
use crate::error::{ApiError, ApiResult};
use crate::ports::HttpClient;

/// Receives the gateway's request to end a session whose credential could
/// not be recovered.
pub trait SessionTerminationHandler: Send + Sync {
    /// Ends the session if it is still the one that was current at `epoch`.
    fn terminate(&self, epoch: Epoch);
}

/// Wraps the transport with the unauthorized-response recovery policy.
///
/// A 401 triggers one shared renewal; if it succeeds the request is
/// performed once more and that result is final. Every other status is
/// passed through as-is.
pub struct RequestGateway {
    client: Arc<dyn HttpClient>,
    renewal: Arc<RenewalCoordinator>,
    store: Arc<CredentialStore>,
    termination: RwLock<Option<Weak<dyn SessionTerminationHandler>>>,
}

impl RequestGateway {
    /// Creates a gateway over `client`.
    #[must_use]
    pub fn new(
        client: Arc<dyn HttpClient>,
        renewal: Arc<RenewalCoordinator>,
        store: Arc<CredentialStore>,
    ) -> Self {
        Self {
            client,
            renewal,
            store,
            termination: RwLock::new(None),
        }
    }

    /// Sets who is told when a session cannot be recovered.
    pub fn set_termination_handler(&self, handler: Weak<dyn SessionTerminationHandler>) {
        *self.termination.write() = Some(handler);
    }

    /// Performs `request`, recovering from one expired credential.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Unauthorized`] if renewal failed, or the request was
    ///   already marked as retried. A failed renewal also terminates the
    ///   session.
    /// - [`ApiError::SessionExpired`] if the request was still rejected after
    ///   a successful renewal; the session is terminated.
    /// - The classified error for any other error status or transport failure.
    pub async fn execute(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
        let epoch = self.store.epoch();
        let response = self.perform(&request).await?;
        if !response.is_unauthorized() {
            return into_result(response);
        }
        if request.retried {
            return Err(ApiError::from_response(&response));
        }

        request.retried = true;
        tracing::debug!(path = %request.path, "credential rejected, renewing");
        let outcome = self.renewal.renew().await;
        if !outcome.is_renewed() {
            self.terminate(epoch);
            return Err(ApiError::from_response(&response));
        }

        tracing::debug!(path = %request.path, "retrying after renewal");
        let retried = self.perform(&request).await?;
        if retried.is_unauthorized() {
            self.terminate(epoch);
            return Err(ApiError::SessionExpired);
        }
        into_result(retried)
    }

    /// Performs `request` and decodes a successful JSON body.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`RequestGateway::execute`], or
    /// [`ApiError::Decode`] for a body that is not valid JSON for `T`.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.execute(request).await?;
        response
            .decode()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn perform(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        self.client.execute(request).await.map_err(ApiError::from)
    }

    fn terminate(&self, epoch: Epoch) {
        let handler = self.termination.read().as_ref().and_then(Weak::upgrade);
        match handler {
            Some(handler) => handler.terminate(epoch),
            None => tracing::warn!(%epoch, "session unrecoverable but no handler is set"),
        }
    }
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("renewal", &self.renewal)
            .finish_non_exhaustive()
    }
}

fn into_result(response: ApiResponse) -> ApiResult<ApiResponse> {
    if response.status.is_error() {
        Err(ApiError::from_response(&response))
    } else {
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use tolk_domain::HttpMethod;

    use super::*;
    use crate::testing::{Reply, ScriptedClient};

    #[derive(Default)]
    struct RecordingHandler {
        epochs: Mutex<Vec<Epoch>>,
    }

    impl SessionTerminationHandler for RecordingHandler {
        fn terminate(&self, epoch: Epoch) {
            self.epochs.lock().push(epoch);
        }
    }

    struct Fixture {
        client: Arc<ScriptedClient>,
        gateway: Arc<RequestGateway>,
        handler: Arc<RecordingHandler>,
    }

    fn fixture() -> Fixture {
        let client = ScriptedClient::new();
        let renewal = Arc::new(RenewalCoordinator::new(
            client.clone(),
            Duration::from_secs(10),
        ));
        let gateway = Arc::new(RequestGateway::new(
            client.clone(),
            renewal,
            Arc::new(CredentialStore::new()),
        ));
        let handler = Arc::new(RecordingHandler::default());
        let weak: Weak<RecordingHandler> = Arc::downgrade(&handler);
        gateway.set_termination_handler(weak);
        Fixture {
            client,
            gateway,
            handler,
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let f = fixture();
        f.client.on(
            HttpMethod::Get,
            "/projects",
            [Reply::Json(200, serde_json::json!([]))],
        );

        let response = f.gateway.execute(ApiRequest::get("/projects")).await.unwrap();
        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(f.client.calls(HttpMethod::Post, "/auth/refresh"), 0);
    }

    #[tokio::test]
    async fn test_non_auth_errors_are_not_recovered() {
        let f = fixture();
        f.client.on(HttpMethod::Get, "/projects", [Reply::Status(403)]);
        f.client.on(HttpMethod::Post, "/projects", [Reply::Status(500)]);

        let forbidden = f.gateway.execute(ApiRequest::get("/projects")).await;
        assert!(matches!(forbidden, Err(ApiError::Forbidden { .. })));
        let failed = f.gateway.execute(ApiRequest::post("/projects")).await;
        assert!(matches!(
            failed,
            Err(ApiError::ServerError {
                status: Some(500),
                ..
            })
        ));
        assert_eq!(f.client.calls(HttpMethod::Post, "/auth/refresh"), 0);
        assert!(f.handler.epochs.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_is_renewed_and_retried_once() {
        let f = fixture();
        f.client.on(
            HttpMethod::Get,
            "/projects",
            [Reply::Status(401), Reply::Json(200, serde_json::json!([1]))],
        );
        f.client.on(HttpMethod::Post, "/auth/refresh", [Reply::Status(200)]);

        let body: serde_json::Value = f
            .gateway
            .execute_json(ApiRequest::get("/projects"))
            .await
            .unwrap();

        assert_eq!(body, serde_json::json!([1]));
        assert_eq!(f.client.calls(HttpMethod::Get, "/projects"), 2);
        assert_eq!(f.client.calls(HttpMethod::Post, "/auth/refresh"), 1);
    }

    #[tokio::test]
    async fn test_retry_is_never_retried_again() {
        let f = fixture();
        f.client.on(HttpMethod::Get, "/projects", [Reply::Status(401)]);
        f.client.on(HttpMethod::Post, "/auth/refresh", [Reply::Status(200)]);

        let result = f.gateway.execute(ApiRequest::get("/projects")).await;

        assert_eq!(result, Err(ApiError::SessionExpired));
        assert_eq!(f.client.calls(HttpMethod::Get, "/projects"), 2);
        assert_eq!(f.client.calls(HttpMethod::Post, "/auth/refresh"), 1);
        assert_eq!(*f.handler.epochs.lock(), vec![Epoch::default()]);
    }

    #[tokio::test]
    async fn test_failed_renewal_propagates_original_error_and_terminates() {
        let f = fixture();
        f.client.on(HttpMethod::Get, "/projects", [Reply::Status(401)]);
        f.client.on(HttpMethod::Post, "/auth/refresh", [Reply::Status(401)]);

        let result = f.gateway.execute(ApiRequest::get("/projects")).await;

        assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
        assert_eq!(f.client.calls(HttpMethod::Get, "/projects"), 1);
        assert_eq!(f.client.calls(HttpMethod::Post, "/auth/refresh"), 1);
        assert_eq!(f.handler.epochs.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_already_retried_request_is_not_recovered() {
        let f = fixture();
        f.client.on(HttpMethod::Get, "/projects", [Reply::Status(401)]);

        let mut request = ApiRequest::get("/projects");
        request.retried = true;
        let result = f.gateway.execute(request).await;

        assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
        assert_eq!(f.client.calls(HttpMethod::Post, "/auth/refresh"), 0);
        assert!(f.handler.epochs.lock().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_requests_share_one_renewal() {
        let f = fixture();
        f.client.on(
            HttpMethod::Get,
            "/projects",
            [
                Reply::Status(401),
                Reply::Status(401),
                Reply::Status(401),
                Reply::Status(200),
            ],
        );
        f.client.on(HttpMethod::Post, "/auth/refresh", [Reply::Status(200)]);
        let gate = f.client.gate(HttpMethod::Post, "/auth/refresh");

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let gateway = Arc::clone(&f.gateway);
                tokio::spawn(async move { gateway.execute(ApiRequest::get("/projects")).await })
            })
            .collect();

        f.client
            .wait_for_calls(HttpMethod::Post, "/auth/refresh", 1)
            .await;
        f.client.wait_for_calls(HttpMethod::Get, "/projects", 3).await;
        gate.notify_one();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(f.client.calls(HttpMethod::Post, "/auth/refresh"), 1);
        assert_eq!(f.client.calls(HttpMethod::Get, "/projects"), 6);
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let f = fixture();
        f.client.on(HttpMethod::Get, "/me", [Reply::Status(200)]);

        let result: ApiResult<serde_json::Value> =
            f.gateway.execute_json(ApiRequest::get("/me")).await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
