//! Shop REST backend client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for accounts and server carts
//! - Plain JSON over HTTP via `reqwest`, one request per operation
//! - No retries, no batching; callers decide what a failure means
//!
//! # Endpoints
//!
//! ```text
//! POST   /api/login                 {email, password} -> {user, token?}
//! GET    /api/cart                  -> {items: [...]}
//! POST   /api/cart/addtocart/{id}   {quantity}
//! DELETE /api/cart/{id}
//! ```
//!
//! Authenticated calls carry `Authorization: Bearer <token>`.

pub mod types;

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use souk_core::{AuthToken, CartItem, CartItemId, ProductId};

use crate::config::ShopApiConfig;
pub use types::{ApiUser, LoginResponse};
use types::{AddToCartRequest, CartResponse, ErrorBody, LoginRequest};

/// Errors that can occur when talking to the shop backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Request failed with status code {}", .status.as_u16())]
    Status {
        status: StatusCode,
        /// `message` field of the error body, when the backend sent one.
        message: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot carry path segments.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// The message the backend attached to a failed request, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    /// HTTP status returned by the backend, if the request got that far.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// ShopApiClient
// =============================================================================

/// Client for the shop REST backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ShopApiClient {
    inner: Arc<ShopApiClientInner>,
}

struct ShopApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ShopApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: &ShopApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("souk-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's message on rejection.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["api", "login"])?;
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let request = self.inner.client.post(url).json(&body);
        self.send_json(request, None).await
    }

    /// Fetch the server cart for the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body is malformed.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: Option<&AuthToken>) -> Result<Vec<CartItem>, ApiError> {
        let url = self.endpoint(&["api", "cart"])?;
        let request = self.inner.client.get(url);
        let response: CartResponse = self.send_json(request, token).await?;
        Ok(response.items)
    }

    /// Add `quantity` of a product to the server cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend does not confirm the addition.
    #[instrument(skip(self, token, product_id), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        token: Option<&AuthToken>,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "cart", "addtocart", product_id.as_str()])?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&AddToCartRequest { quantity });
        self.send(request, token).await.map(drop)
    }

    /// Delete a line from the server cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend does not confirm the deletion.
    #[instrument(skip(self, token, item_id), fields(item_id = %item_id))]
    pub async fn remove_from_cart(
        &self,
        token: Option<&AuthToken>,
        item_id: &CartItemId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "cart", item_id.as_str()])?;
        let request = self.inner.client.delete(url);
        self.send(request, token).await.map(drop)
    }

    /// Resolve path segments against the base URL, percent-encoding each.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and map non-success statuses to `ApiError::Status`.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&AuthToken>,
    ) -> Result<reqwest::Response, ApiError> {
        let request = match token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Error bodies are best effort; an unreadable body just means no message.
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message);

        tracing::warn!(
            status = %status,
            body = %text.chars().take(500).collect::<String>(),
            "Shop backend returned non-success status"
        );

        Err(ApiError::Status { status, message })
    }

    /// Send a request and decode a JSON success body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&AuthToken>,
    ) -> Result<T, ApiError> {
        let response = self.send(request, token).await?;

        // Get response body as text first for better error diagnostics
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse shop backend response"
            );
            ApiError::Parse(e)
        })
    }
}
