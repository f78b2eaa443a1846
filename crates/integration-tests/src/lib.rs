//! End-to-end test harness for the Souk storefront.
//!
//! Each [`TestContext`] serves the real storefront router on an ephemeral
//! port, backed by an in-memory session store and a `wiremock` shop
//! backend. Requests go through a cookie-keeping `reqwest` client that does
//! not follow redirects, so tests can assert on `Location`.
//!
//! ```bash
//! cargo test -p souk-integration-tests
//! ```

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode, header::LOCATION, redirect::Policy};
use serde_json::{Value, json};
use souk_storefront::config::{ShopApiConfig, StorefrontConfig};
use souk_storefront::state::AppState;
use tower_sessions::MemoryStore;
use wiremock::MockServer;

/// A running storefront wired to a mock backend.
pub struct TestContext {
    /// Mock shop backend. Expectations are verified when it drops.
    pub backend: MockServer,
    /// Cookie-keeping client that does not follow redirects.
    pub client: Client,
    base_url: String,
}

impl TestContext {
    /// Start a mock backend and a storefront pointed at it.
    pub async fn start() -> Self {
        let backend = MockServer::start().await;

        let config = StorefrontConfig {
            host: "127.0.0.1".parse().expect("valid host"),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            database_url: None,
            shop_api: ShopApiConfig::new(&backend.uri(), Duration::from_secs(5))
                .expect("mock backend URL is valid"),
            currency: "MAD".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let state = AppState::new(config, None).expect("Failed to build app state");
        let app = souk_storefront::app(state, MemoryStore::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener has an address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("storefront server failed");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            backend,
            client,
            base_url: format!("http://{addr}"),
        }
    }

    /// Absolute storefront URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a storefront page.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET a storefront page and return its body, asserting a 200.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        response.text().await.expect("page body")
    }

    /// POST a form to the storefront.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Put a line in the guest cart.
    pub async fn add_guest_item(&self, product_id: &str, name: &str, price: &str, quantity: u32) {
        let quantity = quantity.to_string();
        let response = self
            .post_form(
                "/cart/add",
                &[
                    ("product_id", product_id),
                    ("quantity", &quantity),
                    ("name", name),
                    ("price", price),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    /// Submit the login form.
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post_form("/auth/login", &[("email", email), ("password", password)])
            .await
    }

    /// Submit the logout form.
    pub async fn logout(&self) -> Response {
        self.post_form("/auth/logout", &[]).await
    }
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("response has a Location header")
}

/// Backend body for a successful login.
#[must_use]
pub fn login_body(role: &str, token: &str) -> Value {
    json!({
        "user": {"_id": "u-1", "email": "buyer@souk.ma", "name": "Buyer", "role": role},
        "token": token,
    })
}

/// Backend body for `GET /api/cart`: `(line id, name, price, quantity)`.
#[must_use]
pub fn cart_body(lines: &[(&str, &str, &str, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, name, price, quantity)| {
            json!({
                "id": id,
                "quantity": quantity,
                "price": price,
                "product": {"name": name},
            })
        })
        .collect();
    json!({ "items": items })
}
