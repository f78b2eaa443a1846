//! Cart route handlers.
//!
//! The cart page shows the server cart for authenticated visitors and the
//! session-held guest cart for everyone else. Every page load re-enters the
//! reducer's loading state and fetches again; nothing is cached between
//! loads besides the mirror kept for the home page count.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use souk_core::{
    AuthToken, CartAction, CartItemId, CartLine, CartState, CartStatus, GuestCartItem,
    MAX_LINE_QUANTITY, Price, PriceError, ProductId,
};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, load_cart_state, save_cart_state};
use crate::state::AppState;

/// Where cart forms send the visitor back to.
const CART_PATH: &str = "/cart";

/// Shown in place of an amount that does not fit in a decimal.
const AMOUNT_OUT_OF_RANGE: &str = "out of range";

fn display_amount(amount: std::result::Result<Price, PriceError>) -> String {
    match amount {
        Ok(price) => price.display(),
        Err(e) => {
            tracing::warn!(error = %e, "Cart amount out of range");
            AMOUNT_OUT_OF_RANGE.to_string()
        }
    }
}

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl CartItemView {
    fn from_line<L: CartLine>(line: &L) -> Self {
        Self {
            id: line.line_id().to_string(),
            name: line.display_name().to_string(),
            image: line.display_image().map(String::from),
            quantity: line.quantity(),
            price: line.unit_price().display(),
            line_price: display_amount(line.line_total()),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub loading: bool,
    pub error: Option<String>,
    pub items: Vec<CartItemView>,
    pub total: String,
    pub currency: String,
}

impl CartView {
    /// Build the view of the active list. Items are only listed when the
    /// state is loaded.
    #[must_use]
    pub fn new(state: &CartState, authenticated: bool, currency: &str) -> Self {
        let mut view = Self {
            loading: false,
            error: None,
            items: Vec::new(),
            total: display_amount(state.active_total(authenticated)),
            currency: currency.to_string(),
        };

        match state.status(authenticated) {
            CartStatus::Loading => view.loading = true,
            CartStatus::Error(message) => view.error = Some(message.to_string()),
            CartStatus::Empty => {}
            CartStatus::Loaded if authenticated => {
                view.items = state.items.iter().map(CartItemView::from_line).collect();
            }
            CartStatus::Loaded => {
                view.items = state
                    .guest_items
                    .iter()
                    .map(CartItemView::from_line)
                    .collect();
            }
        }

        view
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
///
/// Guests also submit the display fields, since the guest cart is never
/// looked up against the backend.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
    pub name: Option<String>,
    pub price: Option<String>,
    pub image: Option<String>,
}

/// Remove from cart form data.
///
/// `id` is the server cart line ID for authenticated visitors and the
/// product ID for guests.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub user: Option<String>,
}

/// Checkout summary template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/checkout.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub user: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Run one load cycle of the server cart: loading, then loaded or error.
async fn load_server_cart(state: &AppState, token: Option<&AuthToken>, cart: &mut CartState) {
    cart.apply(CartAction::GetCart);
    match state.api().get_cart(token).await {
        Ok(items) => cart.apply(CartAction::GetCartSuccess(items)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch cart");
            cart.apply(CartAction::GetCartFailure(e.to_string()));
        }
    }
}

/// Persist the cart state, logging instead of failing the request.
async fn store_cart(session: &Session, cart: &CartState) {
    if let Err(e) = save_cart_state(session, cart).await {
        tracing::error!("Failed to save cart state: {e}");
    }
}

/// Display cart page.
#[instrument(skip(state, session, auth), fields(authenticated = auth.is_authenticated()))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> impl IntoResponse {
    let mut cart = load_cart_state(&session).await;

    match &auth.0 {
        Some(auth) => load_server_cart(&state, auth.token.as_ref(), &mut cart).await,
        None => {
            cart.apply(CartAction::GetCart);
            cart.apply(CartAction::LoadGuestCart);
        }
    }
    store_cart(&session, &cart).await;

    CartShowTemplate {
        cart: CartView::new(&cart, auth.is_authenticated(), &state.config().currency),
        user: auth.0.map(|a| a.display_name().to_string()),
    }
}

/// Add item to cart.
///
/// Authenticated visitors add straight to the server cart. Guests add to
/// the session cart, where a repeated product bumps the existing quantity.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a quantity outside
/// `1..=MAX_LINE_QUANTITY`, missing guest display fields, or a guest price
/// outside `0..=Price::MAX_UNIT`, and `AppError::Api` if the backend rejects
/// the line.
#[instrument(skip(state, session, auth))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let quantity = form.quantity.unwrap_or(1);
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )));
    }
    let product_id = ProductId::new(form.product_id.trim());
    if product_id.as_str().is_empty() {
        return Err(AppError::BadRequest("product_id is required".to_string()));
    }

    if let Some(auth) = &auth.0 {
        state
            .api()
            .add_to_cart(auth.token.as_ref(), &product_id, quantity)
            .await?;
    } else {
        let name = form
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("name is required".to_string()))?;
        let price = form
            .price
            .as_deref()
            .map(Price::from_str)
            .transpose()
            .map_err(|e| AppError::BadRequest(format!("price: {e}")))?
            .ok_or_else(|| AppError::BadRequest("price is required".to_string()))?;
        if !price.is_valid_unit() {
            return Err(AppError::BadRequest(format!(
                "price must be between 0 and {}",
                Price::MAX_UNIT
            )));
        }

        let mut cart = load_cart_state(&session).await;
        if cart.guest_quantity(&product_id).saturating_add(quantity) > MAX_LINE_QUANTITY {
            return Err(AppError::BadRequest(format!(
                "quantity must be between 1 and {MAX_LINE_QUANTITY}"
            )));
        }
        cart.apply(CartAction::AddToGuestCart(GuestCartItem {
            id: product_id.clone(),
            quantity,
            price,
            name,
            image: form.image.filter(|i| !i.is_empty()),
        }));
        save_cart_state(&session, &cart).await?;
    }

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    Ok(Redirect::to(CART_PATH))
}

/// Remove item from cart.
///
/// Authenticated removal only touches the mirror once the backend confirms
/// the delete; a failed delete is logged and the line stays. Guest removal
/// is immediate and never hits the network.
#[instrument(skip(state, session, auth))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let mut cart = load_cart_state(&session).await;

    if let Some(auth) = &auth.0 {
        let item_id = CartItemId::new(form.id);
        match state
            .api()
            .remove_from_cart(auth.token.as_ref(), &item_id)
            .await
        {
            Ok(()) => cart.apply(CartAction::RemoveFromCart(item_id)),
            Err(e) => {
                tracing::error!(item_id = %item_id, error = %e, "Failed to remove from cart");
            }
        }
    } else {
        cart.apply(CartAction::RemoveFromGuestCart(ProductId::new(form.id)));
    }

    store_cart(&session, &cart).await;
    Redirect::to(CART_PATH).into_response()
}

/// Display the checkout summary of the server cart.
///
/// Guests never get here: [`RequireAuth`] remembers `/checkout` and sends
/// them to the login page first.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> impl IntoResponse {
    let mut cart = load_cart_state(&session).await;
    load_server_cart(&state, auth.token.as_ref(), &mut cart).await;
    store_cart(&session, &cart).await;

    CheckoutTemplate {
        cart: CartView::new(&cart, true, &state.config().currency),
        user: Some(auth.display_name().to_string()),
    }
}
