//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::{OptionalAuth, load_cart_state};

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Name of the signed-in user, `None` for guests.
    pub user: Option<String>,
    /// Lines in the visitor's active cart as of the last load.
    pub cart_count: usize,
}

/// Display the home page.
#[instrument(skip(session, auth))]
pub async fn home(session: Session, auth: OptionalAuth) -> impl IntoResponse {
    let cart = load_cart_state(&session).await;

    HomeTemplate {
        cart_count: cart.active_len(auth.is_authenticated()),
        user: auth.0.map(|a| a.display_name().to_string()),
    }
}
