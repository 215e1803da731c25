//! Identity and role types

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Authorization category of a user.
///
/// A user without a role is represented as `None` wherever a `Role` is
/// optional; such a user has not finished role initialization yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Submits documents for translation.
    Customer,
    /// Delivers translations.
    Translator,
    /// Arbitrates between customers and translators.
    Administrator,
}

impl Role {
    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Translator => "TRANSLATOR",
            Self::Administrator => "ADMINISTRATOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.to_uppercase().as_str() {
            "CUSTOMER" => Ok(Self::Customer),
            "TRANSLATOR" => Ok(Self::Translator),
            "ADMINISTRATOR" => Ok(Self::Administrator),
            _ => Err(DomainError::UnknownRole(s.to_string())),
        }
    }
}

/// The authenticated user as known to the client.
///
/// Never patched in place: a changed identity is fetched again and replaces
/// the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Server-side user id
    pub id: Uuid,
    /// Name shown in the UI
    #[serde(rename = "name")]
    pub display_name: String,
    /// Login e-mail address
    #[serde(rename = "emailAddress")]
    pub email: String,
    /// Assigned role, `None` until role initialization is complete
    #[serde(default)]
    pub role: Option<Role>,
    /// Languages the user works with
    #[serde(default)]
    pub languages: BTreeSet<String>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Returns true if the user still has to pick a role.
    #[must_use]
    pub const fn needs_initialization(&self) -> bool {
        self.role.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(
            serde_json::to_string(&Role::Administrator).unwrap(),
            "\"ADMINISTRATOR\""
        );
        assert_eq!("translator".parse::<Role>().unwrap(), Role::Translator);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_identity_from_server_document() {
        let identity: Identity = serde_json::from_value(serde_json::json!({
            "id": "0191e3b4-6f7a-7c3e-9a52-1f0d4c2b8e11",
            "name": "Jana Nováková",
            "emailAddress": "jana@example.com",
            "role": "TRANSLATOR",
            "languages": ["de", "cs", "de"],
            "createdAt": "2025-01-15T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(identity.display_name, "Jana Nováková");
        assert_eq!(identity.email, "jana@example.com");
        assert_eq!(identity.role, Some(Role::Translator));
        assert_eq!(identity.languages.len(), 2);
        assert!(!identity.needs_initialization());
    }

    #[test]
    fn test_identity_without_role_needs_initialization() {
        let identity: Identity = serde_json::from_value(serde_json::json!({
            "id": "0191e3b4-6f7a-7c3e-9a52-1f0d4c2b8e11",
            "name": "New User",
            "emailAddress": "new@example.com",
            "role": null,
            "createdAt": "2025-01-15T10:00:00Z"
        }))
        .unwrap();
        assert!(identity.needs_initialization());
        assert!(identity.languages.is_empty());

        let identity: Identity = serde_json::from_value(serde_json::json!({
            "id": "0191e3b4-6f7a-7c3e-9a52-1f0d4c2b8e11",
            "name": "New User",
            "emailAddress": "new@example.com",
            "createdAt": "2025-01-15T10:00:00Z"
        }))
        .unwrap();
        assert!(identity.needs_initialization());
    }
}
