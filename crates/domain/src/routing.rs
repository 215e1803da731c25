//! Route authorization.
//!
//! [`RoutePaths::decide`] maps the current session state and a requested
//! path to a verdict. It performs no I/O and never fails; the host turns a
//! redirect verdict into whatever navigation primitive it has.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::session::{Role, SessionState};

const ROOT_PATH: &str = "/";

/// Verdict for a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    /// The navigation may proceed.
    Allow,
    /// The navigation must go to this path instead.
    RedirectTo(String),
}

impl AuthorizationDecision {
    /// Returns true if the navigation may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns the redirect target, if any.
    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::RedirectTo(path) => Some(path),
        }
    }
}

/// The application's well-known route prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePaths {
    /// Login / registration page
    pub auth: String,
    /// Role initialization page
    pub init: String,
    /// Customer home
    pub customer: String,
    /// Translator home
    pub translator: String,
    /// Administrator home
    pub admin: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            auth: "/auth".to_string(),
            init: "/init".to_string(),
            customer: "/customer".to_string(),
            translator: "/translator".to_string(),
            admin: "/admin".to_string(),
        }
    }
}

impl RoutePaths {
    /// Returns the home path of an assigned role.
    #[must_use]
    pub fn home_path_of(&self, role: Role) -> &str {
        match role {
            Role::Customer => &self.customer,
            Role::Translator => &self.translator,
            Role::Administrator => &self.admin,
        }
    }

    /// Returns where a user in `state` should land after login or restore.
    #[must_use]
    pub fn landing_path(&self, state: &SessionState) -> &str {
        match state.identity() {
            None => &self.auth,
            Some(identity) => identity
                .role
                .map_or(self.init.as_str(), |role| self.home_path_of(role)),
        }
    }

    /// Checks that every path is absolute and query-free, and that no path
    /// equals or lies under another one.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPath`] for the first offending path.
    pub fn validate(&self) -> DomainResult<()> {
        let all = self.all();
        for path in all {
            if !path.starts_with('/') || path.ends_with('/') || path.contains(['?', '#']) {
                return Err(DomainError::InvalidPath(path.to_string()));
            }
        }
        for (i, path) in all.iter().enumerate() {
            for (j, other) in all.iter().enumerate() {
                if i == j || !is_under(path, other) {
                    continue;
                }
                let reason = if path == other {
                    format!("{path} is used twice")
                } else {
                    format!("{path} is nested under {other}")
                };
                return Err(DomainError::InvalidPath(reason));
            }
        }
        Ok(())
    }

    /// Decides whether a user in `state` may open `requested`.
    ///
    /// Rules, first match wins:
    /// 1. Without an identity only the auth page is allowed; everything else
    ///    goes to the auth page, keeping the original query string.
    /// 2. A user without a role may only open the init page.
    /// 3. A user with a role may open anything under their home. The root,
    ///    the init page, other roles' homes, and unknown paths redirect home;
    ///    the auth page redirects to `/`.
    #[must_use]
    pub fn decide(&self, state: &SessionState, requested: &str) -> AuthorizationDecision {
        let (path, query) = split_request(requested);

        let Some(identity) = state.identity() else {
            if path == self.auth {
                return AuthorizationDecision::Allow;
            }
            return AuthorizationDecision::RedirectTo(match query {
                Some(query) => format!("{}?{query}", self.auth),
                None => self.auth.clone(),
            });
        };

        let Some(role) = identity.role else {
            if path == self.init {
                return AuthorizationDecision::Allow;
            }
            return AuthorizationDecision::RedirectTo(self.init.clone());
        };

        let home = self.home_path_of(role);
        if is_under(path, home) {
            AuthorizationDecision::Allow
        } else if is_under(path, &self.auth) {
            AuthorizationDecision::RedirectTo(ROOT_PATH.to_string())
        } else {
            AuthorizationDecision::RedirectTo(home.to_string())
        }
    }

    fn all(&self) -> [&str; 5] {
        [
            &self.auth,
            &self.init,
            &self.customer,
            &self.translator,
            &self.admin,
        ]
    }
}

/// Decides with the default route paths.
#[must_use]
pub fn decide(state: &SessionState, requested: &str) -> AuthorizationDecision {
    RoutePaths::default().decide(state, requested)
}

/// Splits a requested URL into its path and non-empty query string. The
/// fragment is dropped and an empty path counts as the root.
fn split_request(requested: &str) -> (&str, Option<&str>) {
    let without_fragment = requested.split_once('#').map_or(requested, |(head, _)| head);
    let (path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query).filter(|q| !q.is_empty())),
        None => (without_fragment, None),
    };
    if path.is_empty() {
        (ROOT_PATH, query)
    } else {
        (path, query)
    }
}

/// Segment-aware prefix match: `/customer` covers `/customer` and
/// `/customer/...` but not `/customers`.
fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
