//! Authentication extractors and session helpers.
//!
//! A visitor is authenticated when their session holds an [`AuthSession`]
//! with a token. Everything else is a guest.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use souk_core::navigation::safe_redirect_path;

use crate::models::{AuthSession, session_keys};

/// Login page path.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires an authenticated visitor.
///
/// Guests are redirected to the login page after their requested path is
/// remembered as the post-login redirect target.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(auth): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", auth.display_name())
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Error returned when authentication is required but the visitor is a guest.
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// No session layer is installed.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        if let Some(auth) = get_auth_session(session).await
            && auth.is_authenticated()
        {
            return Ok(Self(auth));
        }

        let requested = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
        if let Err(e) = set_redirect_path(session, requested).await {
            tracing::warn!("Failed to remember redirect path: {e}");
        }

        Err(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the authenticated visitor.
///
/// Yields `None` for guests, including sessions that logged in without
/// receiving a token.
pub struct OptionalAuth(pub Option<AuthSession>);

impl OptionalAuth {
    /// Whether the visitor is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => get_auth_session(session)
                .await
                .filter(AuthSession::is_authenticated),
            None => None,
        };

        Ok(Self(auth))
    }
}

/// Read the stored authentication state, if any.
pub async fn get_auth_session(session: &Session) -> Option<AuthSession> {
    match session.get::<AuthSession>(session_keys::AUTH).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!("Failed to read auth session: {e}");
            None
        }
    }
}

/// Helper to store the authentication state after login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_session(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::AUTH, auth).await
}

/// Helper to clear the authentication state (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<AuthSession>(session_keys::AUTH).await?;
    Ok(())
}

/// Remember where to send the visitor after login.
///
/// Unsafe (non-local) paths are ignored.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_redirect_path(
    session: &Session,
    path: &str,
) -> Result<(), tower_sessions::session::Error> {
    match safe_redirect_path(path) {
        Some(path) => session.insert(session_keys::REDIRECT_PATH, path).await,
        None => Ok(()),
    }
}

/// Read the stored redirect path.
pub async fn get_redirect_path(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::REDIRECT_PATH)
        .await
        .ok()
        .flatten()
}

/// Forget the stored redirect path once it has been used.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_redirect_path(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(session_keys::REDIRECT_PATH).await?;
    Ok(())
}
