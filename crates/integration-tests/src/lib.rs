//! Integration tests for Gamevault.
//!
//! The tests talk HTTP to a running server backed by a migrated database.
//! They are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! gv-cli migrate
//! gv-cli admin create -e admin@example.com -u admin -p "$GAMEVAULT_TEST_ADMIN_PASSWORD"
//! GAMEVAULT_TRUSTED_PROXIES=127.0.0.1,::1 cargo run -p gamevault-storefront &
//!
//! GAMEVAULT_TEST_ADMIN_EMAIL=admin@example.com \
//!     cargo test -p gamevault-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `GAMEVAULT_TEST_BASE_URL` - Server under test (default: <http://localhost:3000>)
//! - `GAMEVAULT_TEST_ADMIN_EMAIL` / `GAMEVAULT_TEST_ADMIN_PASSWORD` - An admin account
//! - `DATABASE_URL` - The server's database, for fixtures the API cannot create
//! - `GAMEVAULT_TEST_STRIPE_WEBHOOK_SECRET` - The server's `STRIPE_WEBHOOK_SECRET`;
//!   webhook tests are skipped without it

#![allow(clippy::missing_panics_doc)]

use hmac::{Hmac, Mac};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use sha2::Sha256;
use uuid::Uuid;

/// Base URL for the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("GAMEVAULT_TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A freshly registered customer.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub token: String,
}

/// HTTP client bound to the server under test.
///
/// Each context presents its own client address in `X-Forwarded-For`, so
/// tests do not share a rate-limit bucket. The server only honours that
/// header from loopback when started with
/// `GAMEVAULT_TRUSTED_PROXIES=127.0.0.1,::1`.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    forwarded_for: String,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Create a context with its own synthetic client address.
    #[must_use]
    pub fn new() -> Self {
        let bytes = Uuid::new_v4().into_bytes();
        Self {
            client: Client::new(),
            base_url: base_url(),
            forwarded_for: format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2]),
        }
    }

    /// Build a request to `path` (which starts with `/`).
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("x-forwarded-for", &self.forwarded_for)
    }

    /// Build an authenticated request.
    #[must_use]
    pub fn authed(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(token)
    }

    /// Register a new customer with a unique email.
    pub async fn signup(&self) -> TestUser {
        let email = format!("it-{}@example.com", Uuid::new_v4());
        let password = "correct horse battery staple".to_string();

        let resp = self
            .request(Method::POST, "/api/auth/signup")
            .json(&json!({
                "username": "integration",
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to sign up");
        assert_eq!(resp.status(), StatusCode::CREATED, "signup failed");

        let body: Value = resp.json().await.expect("Invalid signup response");
        TestUser {
            id: body["user"]["id"].as_i64().expect("user id"),
            email,
            password,
            token: body["token"].as_str().expect("token").to_string(),
        }
    }

    /// Sign in as the configured admin account.
    pub async fn admin_token(&self) -> String {
        let email = std::env::var("GAMEVAULT_TEST_ADMIN_EMAIL")
            .expect("GAMEVAULT_TEST_ADMIN_EMAIL must be set");
        let password = std::env::var("GAMEVAULT_TEST_ADMIN_PASSWORD")
            .expect("GAMEVAULT_TEST_ADMIN_PASSWORD must be set");

        let resp = self
            .request(Method::POST, "/api/auth/signin")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to sign in as admin");
        assert_eq!(resp.status(), StatusCode::OK, "admin signin failed");

        let body: Value = resp.json().await.expect("Invalid signin response");
        assert_eq!(body["user"]["isAdmin"], true, "test account is not an admin");
        body["token"].as_str().expect("token").to_string()
    }

    /// Create a product as admin and return its JSON.
    pub async fn create_product(&self, admin_token: &str, price: &str, stock: i32) -> Value {
        let resp = self
            .authed(Method::POST, "/api/products", admin_token)
            .json(&json!({
                "title": format!("Integration Game {}", Uuid::new_v4()),
                "description": "Created by the integration tests.",
                "genre": "Puzzle",
                "platform": "PC",
                "price": price,
                "stock": stock,
            }))
            .send()
            .await
            .expect("Failed to create product");
        assert_eq!(resp.status(), StatusCode::CREATED, "product create failed");
        resp.json().await.expect("Invalid product response")
    }

    /// Delete a product as admin, ignoring the outcome.
    pub async fn delete_product(&self, admin_token: &str, id: i64) {
        let _ = self
            .authed(Method::DELETE, &format!("/api/products/{id}"), admin_token)
            .send()
            .await;
    }
}

/// A shipping address accepted by checkout.
#[must_use]
pub fn address() -> Value {
    json!({
        "fullName": "Ada Lovelace",
        "line1": "12 Analytical Row",
        "city": "London",
        "postalCode": "N1 9GU",
        "country": "GB",
    })
}

/// Webhook secret shared with the server, if the run configures one.
#[must_use]
pub fn webhook_secret() -> Option<String> {
    std::env::var("GAMEVAULT_TEST_STRIPE_WEBHOOK_SECRET").ok()
}

/// A `Stripe-Signature` header value for `payload` signed now.
#[must_use]
pub fn stripe_signature(secret: &str, payload: &str) -> String {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs();
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

/// Record a payment intent on an order directly in the database.
///
/// Stands in for checkout with a Stripe intent that is still processing.
pub async fn attach_payment_intent(order_id: i64, intent_id: &str) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::PgPool::connect(&url)
        .await
        .expect("Failed to connect to database");
    let result = sqlx::query("UPDATE store.orders SET payment_intent_id = $1 WHERE id = $2")
        .bind(intent_id)
        .bind(i32::try_from(order_id).expect("order id fits in INTEGER"))
        .execute(&pool)
        .await
        .expect("Failed to attach payment intent");
    assert_eq!(result.rows_affected(), 1, "order {order_id} not found");
    pool.close().await;
}
