//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souk_core::{AuthToken, Role, UserId};

use crate::api::LoginResponse;

/// Session-stored user identity, as reported by the backend at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Option<UserId>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
}

/// Authentication state for a visitor.
///
/// A session may exist without a token when the backend did not issue one.
/// Such a visitor is still treated as a guest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: Option<AuthToken>,
    pub user: CurrentUser,
    pub logged_in_at: DateTime<Utc>,
}

impl AuthSession {
    /// Build the session from a successful login response.
    #[must_use]
    pub fn from_login(response: LoginResponse) -> Self {
        Self {
            token: response.token,
            user: CurrentUser {
                id: response.user.id,
                email: response.user.email,
                name: response.user.name,
                role: response.user.role,
            },
            logged_in_at: Utc::now(),
        }
    }

    /// Whether the visitor counts as logged in (a token is present).
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user
            .name
            .as_deref()
            .or(self.user.email.as_deref())
            .unwrap_or("customer")
    }
}

/// Session keys.
pub mod session_keys {
    /// Key for the authenticated session.
    pub const AUTH: &str = "auth";

    /// Key for the cart state (server mirror and guest cart).
    pub const CART: &str = "cart";

    /// Key for the path to return to after login.
    pub const REDIRECT_PATH: &str = "redirect_path";

    /// Key for the login error banner, consumed on display.
    pub const LOGIN_ERROR: &str = "login_error";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn login_response(json: &str) -> LoginResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_from_login_with_token_is_authenticated() {
        let session = AuthSession::from_login(login_response(
            r#"{"user": {"email": "amina@souk.ma", "role": "customer"}, "token": "t"}"#,
        ));
        assert!(session.is_authenticated());
        assert_eq!(session.display_name(), "amina@souk.ma");
    }

    #[test]
    fn test_from_login_without_token_is_guest() {
        let session = AuthSession::from_login(login_response(r#"{"user": {"name": "Amina"}}"#));
        assert!(!session.is_authenticated());
        assert_eq!(session.display_name(), "Amina");
    }

    #[test]
    fn test_session_json_roundtrip_keeps_token() {
        let session = AuthSession::from_login(login_response(
            r#"{"user": {"role": "admin"}, "token": "abc"}"#,
        ));
        let json = serde_json::to_string(&session).unwrap();
        let back: AuthSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.token.unwrap().expose(), "abc");
        assert!(back.user.role.is_admin());
    }
}
