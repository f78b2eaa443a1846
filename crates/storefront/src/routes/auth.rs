//! Authentication route handlers.
//!
//! Login goes through the shop backend. A successful login replays the
//! guest cart into the server cart, refreshes the server cart mirror, and
//! then sends the user on: admins to the dashboard, everyone else to the
//! page they were trying to reach or to `/`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use souk_core::CartAction;
use souk_core::navigation::{DEFAULT_ROUTE, post_login_destination};

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::LOGIN_PATH;
use crate::middleware::{
    OptionalAuth, clear_auth_session, clear_redirect_path, get_redirect_path, load_cart_state,
    save_cart_state, set_auth_session, set_login_error, take_login_error,
};
use crate::models::AuthSession;
use crate::services::cart::{refresh_server_cart, transfer_guest_cart};
use crate::state::AppState;

/// Banner shown when the backend rejects a login without a message.
pub const LOGIN_FAILED_MESSAGE: &str = "Failed to login. Check your credentials.";

/// Banner shown when the form is submitted with an empty field.
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Email and password are required.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub user: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page with any pending error banner.
#[instrument(skip(session, auth))]
pub async fn login_page(session: Session, auth: OptionalAuth) -> impl IntoResponse {
    LoginTemplate {
        error: take_login_error(&session).await,
        user: auth.0.map(|a| a.display_name().to_string()),
    }
}

/// Handle login form submission.
///
/// On failure the backend's message (or a generic one) is flashed and the
/// visitor is sent back to the login page. Transfer and refresh errors
/// after a successful login are logged and never block navigation.
///
/// # Errors
///
/// Returns `AppError::Session` if the session cannot be written.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        set_login_error(&session, MISSING_CREDENTIALS_MESSAGE).await?;
        return Ok(Redirect::to(LOGIN_PATH));
    }
    let password = SecretString::from(form.password);

    let response = match state.api().login(email, &password).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            let message = e.server_message().unwrap_or(LOGIN_FAILED_MESSAGE);
            set_login_error(&session, message).await?;
            return Ok(Redirect::to(LOGIN_PATH));
        }
    };

    let auth = AuthSession::from_login(response);
    if !auth.is_authenticated() {
        tracing::warn!("Backend accepted login but issued no token");
    }

    session.cycle_id().await?;
    set_auth_session(&session, &auth).await?;

    let token = auth.token.as_ref();
    let mut cart = load_cart_state(&session).await;
    let report = transfer_guest_cart(state.api(), token, &mut cart).await;
    if let Err(e) = refresh_server_cart(state.api(), token, &mut cart).await {
        tracing::error!(error = %e, "Failed to refresh cart after login");
    }
    if let Err(e) = save_cart_state(&session, &cart).await {
        tracing::error!("Failed to save cart state after login: {e}");
    }

    let redirect_path = get_redirect_path(&session).await;
    let destination = post_login_destination(&auth.user.role, redirect_path.as_deref()).to_owned();
    if let Err(e) = clear_redirect_path(&session).await {
        tracing::warn!("Failed to clear redirect path: {e}");
    }

    if let Some(user_id) = &auth.user.id {
        set_sentry_user(user_id, auth.user.email.as_deref());
    }
    add_breadcrumb("auth", "Logged in", Some(&[("role", auth.user.role.as_str())]));
    tracing::info!(
        destination = %destination,
        transferred = report.transferred(),
        failed = report.attempted() - report.transferred(),
        "Login succeeded"
    );

    Ok(Redirect::to(&destination))
}

/// Handle logout.
///
/// Clears the authentication state and the server cart mirror. The guest
/// cart is left as is.
///
/// # Errors
///
/// Returns `AppError::Session` if the session cannot be written.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_auth_session(&session).await?;

    let mut cart = load_cart_state(&session).await;
    cart.apply(CartAction::ClearCart);
    save_cart_state(&session, &cart).await?;

    clear_sentry_user();
    add_breadcrumb("auth", "Logged out", None);

    Ok(Redirect::to(DEFAULT_ROUTE))
}
