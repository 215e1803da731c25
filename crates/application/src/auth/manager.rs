//! Session lifecycle orchestration.
//!
//! [`SessionManager`] is the only component that writes the
//! [`CredentialStore`]. Every asynchronous write is gated on the epoch the
//! operation started under, so a late result never overrides a newer
//! login or logout.

use std::sync::{Arc, Weak};

use tolk_domain::{ApiRequest, ApiResponse, Epoch, Identity, Role, RoutePaths, SessionState};

use super::{
    AuthorizationGuard, CredentialStore, RenewalCoordinator, RequestGateway,
    SessionTerminationHandler,
};
use crate::api::{self, Credentials, Registration, RoleAssignment};
use crate::config::SessionConfig;
use crate::error::{ApiError, ApiResult, SessionError, SessionResult};
use crate::ports::{HttpClient, Navigator};

/// Coordinates login, registration, logout, restore, and role assignment.
pub struct SessionManager {
    client: Arc<dyn HttpClient>,
    store: Arc<CredentialStore>,
    gateway: Arc<RequestGateway>,
    navigator: Arc<dyn Navigator>,
    paths: RoutePaths,
}

impl SessionManager {
    /// Wires a session manager and its collaborators over `client`.
    ///
    /// The returned manager is registered as the gateway's termination
    /// handler.
    #[must_use]
    pub fn new(
        config: &SessionConfig,
        client: Arc<dyn HttpClient>,
        navigator: Arc<dyn Navigator>,
    ) -> Arc<Self> {
        let store = Arc::new(CredentialStore::new());
        let renewal = Arc::new(RenewalCoordinator::new(
            Arc::clone(&client),
            config.renew_timeout(),
        ));
        let gateway = Arc::new(RequestGateway::new(
            Arc::clone(&client),
            renewal,
            Arc::clone(&store),
        ));

        Arc::new_cyclic(|this: &Weak<Self>| {
            let handler: Weak<dyn SessionTerminationHandler> = this.clone();
            gateway.set_termination_handler(handler);
            Self {
                client,
                store,
                gateway,
                navigator,
                paths: config.paths.clone(),
            }
        })
    }

    /// Returns the credential store for reading and subscribing.
    #[must_use]
    pub const fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Returns the gateway that every authenticated API call should go through.
    #[must_use]
    pub const fn gateway(&self) -> &Arc<RequestGateway> {
        &self.gateway
    }

    /// Returns the configured route paths.
    #[must_use]
    pub const fn paths(&self) -> &RoutePaths {
        &self.paths
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.store.get()
    }

    /// Returns a route guard reading this manager's store.
    #[must_use]
    pub fn guard(&self) -> AuthorizationGuard {
        AuthorizationGuard::new(
            Arc::clone(&self.store),
            self.paths.clone(),
            Arc::clone(&self.navigator),
        )
    }

    /// Restores the session from whatever credential the transport holds.
    ///
    /// Always ends `Authenticated` or `Unauthenticated`, unless a newer
    /// operation took over in the meantime.
    pub async fn initialize(&self) -> SessionState {
        let epoch = self.store.begin_initializing();
        tracing::debug!(%epoch, "restoring session");

        match self.fetch_identity().await {
            Ok(identity) => {
                if self.store.set_if_current(epoch, identity) {
                    tracing::info!(%epoch, "session restored");
                }
            }
            Err(error) => {
                tracing::info!(%epoch, reason = error.title(), "no session to restore");
                self.store.clear_if_current(epoch);
            }
        }
        self.store.get()
    }

    /// Logs in and loads the identity.
    ///
    /// # Errors
    ///
    /// - The login endpoint's error, unchanged.
    /// - The identity fetch error; the store is cleared.
    /// - [`SessionError::Superseded`] if a logout happened meanwhile.
    pub async fn login(&self, credentials: &Credentials) -> SessionResult<Identity> {
        self.perform_direct(&api::login(credentials)?).await?;
        let epoch = self.store.advance_epoch();
        tracing::info!(%epoch, "logged in");
        self.adopt_identity(epoch).await
    }

    /// Creates an account and loads its identity.
    ///
    /// # Errors
    ///
    /// Same as [`SessionManager::login`].
    pub async fn register(&self, registration: &Registration) -> SessionResult<Identity> {
        self.perform_direct(&api::register(registration)?).await?;
        let epoch = self.store.advance_epoch();
        tracing::info!(%epoch, "registered");
        self.adopt_identity(epoch).await
    }

    /// Assigns a role to the logged-in user and replaces the identity with
    /// the server's updated copy.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotAuthenticated`] without a logged-in user; nothing
    ///   is sent.
    /// - The endpoint's error, unchanged.
    /// - [`SessionError::Superseded`] if the session changed meanwhile.
    pub async fn assign_role(&self, role: Role, languages: Vec<String>) -> SessionResult<Identity> {
        let current = self.current_identity()?;
        let epoch = self.store.epoch();
        let request = api::assign_role(current.id, &RoleAssignment { role, languages })?;

        self.gateway.execute(request).await?;
        let identity = self.fetch_identity().await?;
        self.replace_identity(epoch, identity)
            .inspect(|_| tracing::info!(%epoch, %role, "role assigned"))
    }

    /// Refetches the identity and replaces the held one wholesale.
    ///
    /// A failed refetch leaves the session as it is.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotAuthenticated`] without a logged-in user.
    /// - The fetch error.
    /// - [`SessionError::Superseded`] if the session changed meanwhile.
    pub async fn refresh_identity(&self) -> SessionResult<Identity> {
        self.current_identity()?;
        let epoch = self.store.epoch();
        let identity = self.fetch_identity().await?;
        self.replace_identity(epoch, identity)
    }

    /// Ends the session locally and, best effort, on the server.
    ///
    /// Advances the epoch before anything else, so in-flight renewals and
    /// identity fetches can no longer write the store. The final clear
    /// advances it again, ending whatever started while the server was
    /// being told. A login that completed meanwhile is left alone.
    pub async fn logout(&self) {
        let previous = self.store.get();
        let epoch = self.store.advance_epoch();

        if previous != SessionState::Unauthenticated
            && let Err(error) = self.perform_direct(&api::logout()).await
        {
            tracing::warn!(%epoch, %error, "remote logout failed");
        }

        self.store.terminate_if_current(epoch);
        tracing::info!(%epoch, "logged out");
    }

    /// Redirects to where the current user belongs.
    pub fn navigate_home(&self) {
        let state = self.store.get();
        self.navigator.redirect_to(self.paths.landing_path(&state));
    }

    fn current_identity(&self) -> SessionResult<Arc<Identity>> {
        self.store
            .get()
            .identity()
            .cloned()
            .ok_or(SessionError::NotAuthenticated)
    }

    async fn adopt_identity(&self, epoch: Epoch) -> SessionResult<Identity> {
        match self.fetch_identity().await {
            Ok(identity) => self.replace_identity(epoch, identity),
            Err(error) => {
                self.store.clear_if_current(epoch);
                Err(error.into())
            }
        }
    }

    fn replace_identity(&self, epoch: Epoch, identity: Identity) -> SessionResult<Identity> {
        if self.store.set_if_current(epoch, identity.clone()) {
            Ok(identity)
        } else {
            tracing::debug!(%epoch, current = %self.store.epoch(), "discarding stale identity");
            Err(SessionError::Superseded)
        }
    }

    async fn fetch_identity(&self) -> ApiResult<Identity> {
        self.gateway.execute_json(api::current_identity()).await
    }

    /// Sends a request outside the renewal policy.
    async fn perform_direct(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let response = self.client.execute(request).await?;
        if response.status.is_error() {
            return Err(ApiError::from_response(&response));
        }
        Ok(response)
    }
}

impl SessionTerminationHandler for SessionManager {
    fn terminate(&self, epoch: Epoch) {
        if self.store.terminate_if_current(epoch) {
            tracing::warn!(%epoch, "session could not be renewed, signing out");
            self.navigator.redirect_to(&self.paths.auth);
        } else {
            tracing::debug!(%epoch, "ignoring termination of a past session");
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}
