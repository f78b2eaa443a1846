//! Cart state and the reducer that mutates it.
//!
//! A visitor's cart state holds two independent lists: the mirror of the
//! server cart (authenticated) and the guest cart (unauthenticated). Nothing
//! keeps them exclusive. Callers pick the active list from the session's
//! authentication state, so both lists may be populated and stale relative
//! to each other.
//!
//! All mutation goes through [`CartState::apply`] with a [`CartAction`].
//! The reducer is synchronous and does no I/O.

use serde::{Deserialize, Serialize};

use crate::types::{CartItemId, Price, PriceError, ProductId};

/// Largest quantity a single line may hold after an add.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Product details attached to a server cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Product display name.
    pub name: String,
    /// Product image URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// A line in the server-persisted cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Server-side cart line identifier (used for removal).
    pub id: CartItemId,
    pub quantity: u32,
    /// Unit price.
    pub price: Price,
    pub product: ProductRef,
    /// Line-level image, preferred over the product image when present.
    #[serde(default)]
    pub image: Option<String>,
}

/// A line in the guest cart.
///
/// The identifier is the product ID: this is what gets replayed against
/// the add-to-cart endpoint when the guest logs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCartItem {
    pub id: ProductId,
    pub quantity: u32,
    /// Unit price.
    pub price: Price,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Common view over server and guest cart lines.
pub trait CartLine {
    /// Identifier used by the removal form.
    fn line_id(&self) -> &str;
    /// Name to display.
    fn display_name(&self) -> &str;
    /// Image to display, if any.
    fn display_image(&self) -> Option<&str>;
    fn quantity(&self) -> u32;
    fn unit_price(&self) -> Price;

    /// `unit_price × quantity`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the product does not fit.
    fn line_total(&self) -> Result<Price, PriceError> {
        self.unit_price().times(self.quantity())
    }
}

impl CartLine for CartItem {
    fn line_id(&self) -> &str {
        self.id.as_str()
    }

    fn display_name(&self) -> &str {
        &self.product.name
    }

    fn display_image(&self) -> Option<&str> {
        self.image.as_deref().or(self.product.image.as_deref())
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn unit_price(&self) -> Price {
        self.price
    }
}

impl CartLine for GuestCartItem {
    fn line_id(&self) -> &str {
        self.id.as_str()
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn display_image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn unit_price(&self) -> Price {
        self.price
    }
}

/// Sum of `price × quantity` over a list of lines.
///
/// # Errors
///
/// Returns `PriceError::Overflow` if any line or the running sum does not fit.
pub fn cart_total<L: CartLine>(lines: &[L]) -> Result<Price, PriceError> {
    lines
        .iter()
        .try_fold(Price::ZERO, |total, line| total.checked_add(line.line_total()?))
}

/// Actions accepted by the cart reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// A cart load started.
    GetCart,
    /// The server cart was fetched.
    GetCartSuccess(Vec<CartItem>),
    /// The server cart fetch failed with a message.
    GetCartFailure(String),
    /// The guest cart was read from visitor storage.
    LoadGuestCart,
    /// The server confirmed deletion of a line.
    RemoveFromCart(CartItemId),
    /// Drop a guest line (no server round-trip).
    RemoveFromGuestCart(ProductId),
    /// Add a guest line, or bump the quantity of an existing one.
    AddToGuestCart(GuestCartItem),
    /// Empty the guest cart.
    ClearGuestCart,
    /// Forget the server cart mirror.
    ClearCart,
}

/// Per-visitor cart state.
///
/// Only the two lists are persisted; the loading and error flags describe
/// the load in progress and are reset on every load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    /// Mirror of the server cart.
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Guest cart lines.
    #[serde(default)]
    pub guest_items: Vec<GuestCartItem>,
    #[serde(skip)]
    pub loading: bool,
    #[serde(skip)]
    pub error: Option<String>,
}

/// What the cart view should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus<'a> {
    Loading,
    Error(&'a str),
    Empty,
    Loaded,
}

impl CartState {
    /// Apply an action to the state.
    pub fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::GetCart => {
                self.loading = true;
                self.error = None;
            }
            CartAction::GetCartSuccess(items) => {
                self.items = items;
                self.loading = false;
                self.error = None;
            }
            CartAction::GetCartFailure(message) => {
                self.loading = false;
                self.error = Some(message);
            }
            CartAction::LoadGuestCart => {
                self.loading = false;
                self.error = None;
            }
            CartAction::RemoveFromCart(id) => {
                self.items.retain(|item| item.id != id);
            }
            CartAction::RemoveFromGuestCart(id) => {
                self.guest_items.retain(|item| item.id != id);
            }
            CartAction::AddToGuestCart(item) => {
                match self.guest_items.iter_mut().find(|g| g.id == item.id) {
                    Some(existing) => {
                        existing.quantity = existing.quantity.saturating_add(item.quantity);
                    }
                    None => self.guest_items.push(item),
                }
            }
            CartAction::ClearGuestCart => self.guest_items.clear(),
            CartAction::ClearCart => self.items.clear(),
        }
    }

    /// Quantity already held by the guest line for `product`, if any.
    #[must_use]
    pub fn guest_quantity(&self, product: &ProductId) -> u32 {
        self.guest_items
            .iter()
            .find(|g| &g.id == product)
            .map_or(0, |g| g.quantity)
    }

    /// Number of lines in the list selected by `authenticated`.
    #[must_use]
    pub fn active_len(&self, authenticated: bool) -> usize {
        if authenticated {
            self.items.len()
        } else {
            self.guest_items.len()
        }
    }

    /// Total of the list selected by `authenticated`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the total does not fit.
    pub fn active_total(&self, authenticated: bool) -> Result<Price, PriceError> {
        if authenticated {
            cart_total(&self.items)
        } else {
            cart_total(&self.guest_items)
        }
    }

    /// Rendering status. Loading wins over error, error wins over content.
    #[must_use]
    pub fn status(&self, authenticated: bool) -> CartStatus<'_> {
        if self.loading {
            CartStatus::Loading
        } else if let Some(message) = &self.error {
            CartStatus::Error(message)
        } else if self.active_len(authenticated) == 0 {
            CartStatus::Empty
        } else {
            CartStatus::Loaded
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn guest(id: &str, price: &str, quantity: u32) -> GuestCartItem {
        GuestCartItem {
            id: ProductId::new(id),
            quantity,
            price: Price::from_str(price).unwrap(),
            name: format!("Product {id}"),
            image: None,
        }
    }

    fn server(id: &str, price: &str, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            quantity,
            price: Price::from_str(price).unwrap(),
            product: ProductRef {
                name: format!("Product {id}"),
                image: Some(format!("https://img.example/{id}.jpg")),
            },
            image: None,
        }
    }

    #[test]
    fn test_total_two_decimals() {
        let items = vec![guest("a", "10", 2), guest("b", "5.5", 1)];
        assert_eq!(cart_total(&items).unwrap().display(), "25.50");
    }

    #[test]
    fn test_total_empty_is_zero() {
        assert_eq!(cart_total::<CartItem>(&[]).unwrap().display(), "0.00");
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let huge = "79228162514264337593543950335";
        assert_eq!(
            cart_total(&[server("a", huge, 2)]),
            Err(PriceError::Overflow)
        );
        assert_eq!(
            cart_total(&[server("a", huge, 1), server("b", "1", 1)]),
            Err(PriceError::Overflow)
        );
    }

    #[test]
    fn test_load_lifecycle_success() {
        let mut state = CartState::default();
        state.apply(CartAction::GetCart);
        assert_eq!(state.status(true), CartStatus::Loading);

        state.apply(CartAction::GetCartSuccess(vec![server("1", "3", 1)]));
        assert_eq!(state.status(true), CartStatus::Loaded);
        assert_eq!(state.items.len(), 1);
    }

    #[test]
    fn test_load_lifecycle_failure_keeps_error_until_next_load() {
        let mut state = CartState::default();
        state.apply(CartAction::GetCart);
        state.apply(CartAction::GetCartFailure("boom".to_string()));
        assert_eq!(state.status(true), CartStatus::Error("boom"));

        state.apply(CartAction::GetCart);
        assert_eq!(state.error, None);
        assert!(state.loading);
    }

    #[test]
    fn test_failure_does_not_clear_mirror() {
        let mut state = CartState::default();
        state.apply(CartAction::GetCartSuccess(vec![server("1", "3", 1)]));
        state.apply(CartAction::GetCart);
        state.apply(CartAction::GetCartFailure("down".to_string()));
        assert_eq!(state.items.len(), 1);
    }

    #[test]
    fn test_guest_load_clears_loading() {
        let mut state = CartState {
            guest_items: vec![guest("a", "1", 1)],
            ..CartState::default()
        };
        state.apply(CartAction::GetCart);
        state.apply(CartAction::LoadGuestCart);
        assert_eq!(state.status(false), CartStatus::Loaded);
    }

    #[test]
    fn test_lists_are_independent() {
        let state = CartState {
            items: vec![server("1", "100", 1)],
            guest_items: vec![guest("a", "1", 3)],
            ..CartState::default()
        };
        assert_eq!(state.active_total(true).unwrap().display(), "100.00");
        assert_eq!(state.active_total(false).unwrap().display(), "3.00");
        assert_eq!(state.status(false), CartStatus::Loaded);
    }

    #[test]
    fn test_remove_targets_one_list() {
        let mut state = CartState {
            items: vec![server("1", "1", 1), server("2", "1", 1)],
            guest_items: vec![guest("1", "1", 1)],
            ..CartState::default()
        };
        state.apply(CartAction::RemoveFromCart(CartItemId::new("1")));
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.guest_items.len(), 1);

        state.apply(CartAction::RemoveFromGuestCart(ProductId::new("1")));
        assert!(state.guest_items.is_empty());
        assert_eq!(state.status(false), CartStatus::Empty);
    }

    #[test]
    fn test_add_to_guest_cart_merges_quantity() {
        let mut state = CartState::default();
        state.apply(CartAction::AddToGuestCart(guest("a", "2", 1)));
        state.apply(CartAction::AddToGuestCart(guest("a", "2", 2)));
        state.apply(CartAction::AddToGuestCart(guest("b", "1", 1)));
        assert_eq!(state.guest_items.len(), 2);
        assert_eq!(state.guest_items[0].quantity, 3);
        assert_eq!(state.guest_quantity(&ProductId::new("a")), 3);
        assert_eq!(state.guest_quantity(&ProductId::new("missing")), 0);
    }

    #[test]
    fn test_clear_actions() {
        let mut state = CartState {
            items: vec![server("1", "1", 1)],
            guest_items: vec![guest("a", "1", 1)],
            ..CartState::default()
        };
        state.apply(CartAction::ClearGuestCart);
        assert!(state.guest_items.is_empty());
        assert_eq!(state.items.len(), 1);
        state.apply(CartAction::ClearCart);
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_display_image_prefers_line_image() {
        let mut item = server("1", "1", 1);
        assert_eq!(item.display_image(), Some("https://img.example/1.jpg"));
        item.image = Some("line.jpg".to_string());
        assert_eq!(item.display_image(), Some("line.jpg"));
    }

    #[test]
    fn test_flags_are_not_persisted() {
        let mut state = CartState::default();
        state.apply(CartAction::GetCartFailure("x".to_string()));
        let json = serde_json::to_string(&state).unwrap();
        let back: CartState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.error, None);
        assert!(!back.loading);
    }

    #[test]
    fn test_server_cart_json_shape() {
        let json = r#"{"id": 7, "quantity": 2, "price": "49.90",
            "product": {"name": "Argan oil", "image": "/img/argan.jpg"}}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id.as_str(), "7");
        assert_eq!(item.line_total().unwrap().display(), "99.80");
    }
}
