//! Wire types for the shop REST backend.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use souk_core::{AuthToken, CartItem, Role, UserId};

/// `POST /api/login` request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /api/login` success body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: ApiUser,
    /// Absent when the backend authenticates by other means.
    #[serde(default)]
    pub token: Option<AuthToken>,
}

/// User object inside a login response.
///
/// Only `role` is interpreted; the rest is kept for display. Parsing never
/// fails on a field: `_id` wins over `id`, and a null or mistyped field is
/// treated as absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawUser")]
pub struct ApiUser {
    pub id: Option<UserId>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
}

#[derive(Deserialize)]
struct RawUser {
    #[serde(default, rename = "_id")]
    object_id: Value,
    #[serde(default)]
    id: Value,
    #[serde(default)]
    email: Value,
    #[serde(default)]
    name: Value,
    #[serde(default)]
    role: Value,
}

impl From<RawUser> for ApiUser {
    fn from(raw: RawUser) -> Self {
        let id = [raw.object_id, raw.id]
            .into_iter()
            .find_map(|v| UserId::deserialize(v).ok());
        Self {
            id,
            email: string_field(raw.email),
            name: string_field(raw.name),
            role: string_field(raw.role).map(Role::new).unwrap_or_default(),
        }
    }
}

fn string_field(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// `GET /api/cart` body. A missing or null `items` means an empty cart.
#[derive(Debug, Deserialize)]
pub struct CartResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<CartItem>,
}

/// `POST /api/cart/addtocart/{id}` request body.
#[derive(Debug, Serialize)]
pub struct AddToCartRequest {
    pub quantity: u32,
}

/// Error body the backend sends alongside non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<CartItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<CartItem>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_with_token() {
        let json = r#"{"user": {"_id": "u1", "email": "a@b.ma", "role": "admin"}, "token": "t"}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert!(response.user.role.is_admin());
        assert_eq!(response.user.id.unwrap().as_str(), "u1");
        assert_eq!(response.token.unwrap().expose(), "t");
    }

    #[test]
    fn test_login_response_without_token_or_role() {
        let json = r#"{"user": {"id": 3}}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert!(response.token.is_none());
        assert!(!response.user.role.is_admin());
    }

    #[test]
    fn test_login_user_with_both_ids_prefers_object_id() {
        let json = r#"{"user": {"_id": "u1", "id": 7, "role": "customer"}, "token": "t"}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.user.id.unwrap().as_str(), "u1");
        assert_eq!(response.user.role.as_str(), "customer");
    }

    #[test]
    fn test_login_user_tolerates_null_and_mistyped_fields() {
        let json = r#"{"user": {"_id": null, "id": "", "email": 5, "name": null, "role": null}}"#;
        let user = serde_json::from_str::<LoginResponse>(json).unwrap().user;
        assert!(user.id.is_none());
        assert!(user.email.is_none());
        assert!(user.name.is_none());
        assert_eq!(user.role, Role::default());

        let json = r#"{"user": {"role": ["admin"], "email": "a@b.ma"}}"#;
        let user = serde_json::from_str::<LoginResponse>(json).unwrap().user;
        assert!(!user.role.is_admin());
        assert_eq!(user.email.as_deref(), Some("a@b.ma"));
    }

    #[test]
    fn test_cart_response_missing_or_null_items() {
        let missing: CartResponse = serde_json::from_str("{}").unwrap();
        let null: CartResponse = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(missing.items.is_empty());
        assert!(null.items.is_empty());
    }

    #[test]
    fn test_error_body_tolerates_extra_fields() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message": "Invalid password", "code": 401}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("Invalid password"));
    }
}
