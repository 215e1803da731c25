//! Route guard over the live session state.

use std::sync::Arc;

use tolk_domain::{AuthorizationDecision, RoutePaths};

use super::CredentialStore;
use crate::ports::Navigator;

/// Decides navigations from the current contents of a [`CredentialStore`].
///
/// Reads the store, writes nothing. The decision itself is
/// [`RoutePaths::decide`].
pub struct AuthorizationGuard {
    store: Arc<CredentialStore>,
    paths: RoutePaths,
    navigator: Arc<dyn Navigator>,
}

impl AuthorizationGuard {
    /// Creates a guard.
    #[must_use]
    pub fn new(store: Arc<CredentialStore>, paths: RoutePaths, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            paths,
            navigator,
        }
    }

    /// Returns the verdict for `requested` without navigating.
    #[must_use]
    pub fn decide(&self, requested: &str) -> AuthorizationDecision {
        self.paths.decide(&self.store.get(), requested)
    }

    /// Lets the navigation through, or redirects via the navigator.
    ///
    /// Returns true if `requested` may be shown.
    pub fn enforce(&self, requested: &str) -> bool {
        match self.decide(requested) {
            AuthorizationDecision::Allow => true,
            AuthorizationDecision::RedirectTo(target) => {
                tracing::debug!(requested, target = %target, "navigation redirected");
                self.navigator.redirect_to(&target);
                false
            }
        }
    }
}

impl std::fmt::Debug for AuthorizationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGuard")
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{RecordingNavigator, identity};
    use pretty_assertions::assert_eq;
    use tolk_domain::Role;

    fn guard() -> (Arc<CredentialStore>, Arc<RecordingNavigator>, AuthorizationGuard) {
        let store = Arc::new(CredentialStore::new());
        let navigator = RecordingNavigator::new();
        let guard = AuthorizationGuard::new(
            Arc::clone(&store),
            RoutePaths::default(),
            navigator.clone(),
        );
        (store, navigator, guard)
    }

    #[test]
    fn test_follows_store_changes() {
        let (store, _, guard) = guard();
        assert_eq!(
            guard.decide("/customer"),
            AuthorizationDecision::RedirectTo("/auth".to_string())
        );

        store.set(identity(Some(Role::Customer)));
        assert!(guard.decide("/customer/projects").is_allowed());

        store.clear();
        assert!(guard.decide("/auth").is_allowed());
    }

    #[test]
    fn test_enforce_redirects_through_navigator() {
        let (store, navigator, guard) = guard();
        store.set(identity(Some(Role::Administrator)));

        assert!(guard.enforce("/admin/disputes"));
        assert!(!guard.enforce("/"));
        assert!(!guard.enforce("/translator"));

        assert_eq!(
            navigator.redirects(),
            vec!["/admin".to_string(), "/admin".to_string()]
        );
    }

    #[test]
    fn test_enforce_keeps_deep_link_query() {
        let (_, navigator, guard) = guard();

        assert!(!guard.enforce("/customer/projects?id=42#files"));
        assert_eq!(navigator.redirects(), vec!["/auth?id=42".to_string()]);
    }
}
