//! Session middleware configuration and session-backed visitor storage.
//!
//! Production uses the `PostgreSQL` store from `tower-sessions-sqlx-store`;
//! development and tests use the in-memory store. The session is also
//! where the guest cart lives between requests.

use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};

use souk_core::CartState;

use crate::config::StorefrontConfig;
use crate::models::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "souk_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer for any session store.
///
/// # Arguments
///
/// * `store` - Session store (`PostgresStore` or `MemoryStore`)
/// * `config` - Storefront configuration (for the `Secure` cookie flag)
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &StorefrontConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

// =============================================================================
// Cart State
// =============================================================================

/// Load the visitor's cart state. Read failures yield an empty cart.
pub async fn load_cart_state(session: &Session) -> CartState {
    match session.get::<CartState>(session_keys::CART).await {
        Ok(state) => state.unwrap_or_default(),
        Err(e) => {
            tracing::error!("Failed to read cart state from session: {e}");
            CartState::default()
        }
    }
}

/// Persist the visitor's cart state.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart_state(
    session: &Session,
    state: &CartState,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, state).await
}

// =============================================================================
// Login Error Flash
// =============================================================================

/// Store the login error banner for the next login page render.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_login_error(
    session: &Session,
    message: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::LOGIN_ERROR, message).await
}

/// Take (read and clear) the login error banner.
pub async fn take_login_error(session: &Session) -> Option<String> {
    session
        .remove::<String>(session_keys::LOGIN_ERROR)
        .await
        .ok()
        .flatten()
}
