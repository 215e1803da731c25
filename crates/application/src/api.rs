//! Request descriptors for the session REST surface.
//!
//! | Call | Request |
//! |---|---|
//! | Login | `POST /auth/login {email, password}` |
//! | Register | `POST /auth/register {email, password, name}` |
//! | Logout | `POST /auth/logout` |
//! | Renew | `POST /auth/refresh` |
//! | Current identity | `GET /me` |
//! | Assign role | `PATCH /users/{id}/role {role, languages[]}` |

use std::fmt;

use serde::Serialize;
use tolk_domain::{ApiRequest, DomainResult, Role};
use uuid::Uuid;

/// Login path.
pub const LOGIN_PATH: &str = "/auth/login";
/// Registration path.
pub const REGISTER_PATH: &str = "/auth/register";
/// Logout path.
pub const LOGOUT_PATH: &str = "/auth/logout";
/// Credential renewal path.
pub const REFRESH_PATH: &str = "/auth/refresh";
/// Current identity path.
pub const ME_PATH: &str = "/me";

/// Login credentials.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Login e-mail address
    pub email: String,
    /// Plain-text password, only ever sent to the login endpoint
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// New account data.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Display name
    pub name: String,
    /// Login e-mail address
    pub email: String,
    /// Plain-text password
    pub password: String,
}

impl Registration {
    /// Creates registration data.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of the role-assignment call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleAssignment {
    /// Role to assign
    pub role: Role,
    /// Languages the user works with; may be empty for customers
    pub languages: Vec<String>,
}

/// Builds the login request.
///
/// # Errors
///
/// Returns an error if the body cannot be encoded.
pub fn login(credentials: &Credentials) -> DomainResult<ApiRequest> {
    ApiRequest::post(LOGIN_PATH).with_json(credentials)
}

/// Builds the registration request.
///
/// # Errors
///
/// Returns an error if the body cannot be encoded.
pub fn register(registration: &Registration) -> DomainResult<ApiRequest> {
    ApiRequest::post(REGISTER_PATH).with_json(registration)
}

/// Builds the logout request.
#[must_use]
pub fn logout() -> ApiRequest {
    ApiRequest::post(LOGOUT_PATH)
}

/// Builds the renewal request.
#[must_use]
pub fn refresh() -> ApiRequest {
    ApiRequest::post(REFRESH_PATH)
}

/// Builds the current-identity request.
#[must_use]
pub fn current_identity() -> ApiRequest {
    ApiRequest::get(ME_PATH)
}

/// Builds the role-assignment request for user `id`.
///
/// # Errors
///
/// Returns an error if the body cannot be encoded.
pub fn assign_role(id: Uuid, assignment: &RoleAssignment) -> DomainResult<ApiRequest> {
    ApiRequest::patch(format!("/users/{id}/role")).with_json(assignment)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tolk_domain::HttpMethod;

    #[test]
    fn test_login_body() {
        let request = login(&Credentials::new("a@example.com", "hunter2")).unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path, "/auth/login");
        assert_eq!(
            request.body,
            Some(serde_json::json!({ "email": "a@example.com", "password": "hunter2" }))
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("a@example.com", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        let rendered = format!("{:?}", Registration::new("A", "a@example.com", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_assign_role_request() {
        let id = Uuid::nil();
        let request = assign_role(
            id,
            &RoleAssignment {
                role: Role::Translator,
                languages: vec!["cs".to_string(), "de".to_string()],
            },
        )
        .unwrap();
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(request.path, format!("/users/{id}/role"));
        assert_eq!(
            request.body,
            Some(serde_json::json!({ "role": "TRANSLATOR", "languages": ["cs", "de"] }))
        );
    }
}
