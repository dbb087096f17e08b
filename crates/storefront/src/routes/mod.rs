//! HTTP route handlers for the store.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Readiness (database ping)
//!
//! # Pages (Askama)
//! GET  /                               - Home: popular games, new arrivals
//! GET  /games                          - Catalog with filters
//! GET  /games/{id}                     - Game detail
//!
//! # Auth (strict rate limit)
//! POST /api/auth/signup                - Create account, returns token
//! POST /api/auth/signin                - Returns token
//!
//! # Users
//! GET  /api/users/me                   - Own profile
//! PUT  /api/users/me                   - Update own profile
//! PUT  /api/users/me/password          - Change password
//! GET  /api/users                      - List users (admin)
//! GET  /api/users/{id}                 - User detail (admin)
//! PUT  /api/users/{id}                 - Edit user (admin)
//! DELETE /api/users/{id}               - Delete user (admin)
//!
//! # Products
//! GET  /api/products                   - Paginated, filtered listing
//! GET  /api/products/popular           - Best sellers
//! GET  /api/products/{id}              - Product detail
//! POST /api/products                   - Create (admin)
//! PUT  /api/products/{id}              - Update (admin)
//! DELETE /api/products/{id}            - Delete (admin)
//!
//! # Cart (auth)
//! GET  /api/cart                       - View cart
//! DELETE /api/cart                     - Clear cart
//! POST /api/cart/items                 - Add item
//! PUT  /api/cart/items/{productId}     - Set quantity
//! DELETE /api/cart/items/{productId}   - Remove item
//!
//! # Orders (auth)
//! POST /api/orders                     - Place order from cart
//! GET  /api/orders                     - Own orders
//! GET  /api/orders/{id}                - Order detail (owner or admin)
//! GET  /api/admin/orders               - All orders (admin)
//! PUT  /api/admin/orders/{id}/status   - Change status (admin)
//! DELETE /api/admin/orders/{id}        - Delete order (admin)
//!
//! # Payments (Stripe)
//! POST /api/payments/intent            - Create payment intent (auth)
//! GET  /api/payments/methods           - Saved cards (auth)
//! POST /api/payments/webhook           - Stripe events (signed, not rate limited)
//!
//! # Statistics (admin)
//! GET  /api/admin/stats/summary        - Counts, revenue, low stock
//! GET  /api/admin/stats/sales          - Daily sales
//! GET  /api/admin/stats/best-sellers   - Units sold per product
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod pages;
pub mod payments;
pub mod products;
pub mod stats;
pub mod users;

use axum::{Router, middleware::from_fn};

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::middleware::{
    ClientIpKeyExtractor, api_rate_limiter, auth_rate_limiter, json_rate_limit_response,
};
use crate::state::AppState;

/// Create the full router: health, pages and the JSON API.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(pages::router())
        .nest("/api", api_routes(config))
        .fallback(pages::fallback)
}

/// Create the JSON API router.
///
/// Rate limits key on the client address as seen through
/// `config.trusted_proxies`.
pub fn api_routes(config: &StorefrontConfig) -> Router<AppState> {
    let client_ip = ClientIpKeyExtractor::new(&config.trusted_proxies);

    let limited = Router::new()
        .nest("/users", users::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/admin/orders", orders::admin_router())
        .nest("/admin/stats", stats::router())
        .layer(api_rate_limiter(client_ip.clone()));

    Router::new()
        .nest("/auth", auth::router().layer(auth_rate_limiter(client_ip)))
        .merge(limited)
        .merge(payments::webhook_router())
        .fallback(api_not_found)
        .layer(from_fn(json_rate_limit_response))
}

async fn api_not_found() -> AppError {
    AppError::NotFound("Route not found".to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{
            Request, StatusCode,
            header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
        },
        response::Response,
    };
    use chrono::Utc;
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use gamevault_core::{Email, UserId};

    use super::*;
    use crate::config::{AuthConfig, StorefrontConfig};
    use crate::models::User;

    const CLIENT_IP: &str = "203.0.113.10";
    const PROXY_IP: &str = "10.0.0.1";

    fn peer() -> SocketAddr {
        SocketAddr::new(CLIENT_IP.parse().unwrap(), 41_000)
    }

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/gamevault_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            auth: AuthConfig {
                jwt_secret: SecretString::from("k7#Qp2!vZ9@xL4$mN8^rT1&wY6*bC3%d"),
                token_ttl_hours: 24,
            },
            stripe: None,
            low_stock_threshold: 5,
            cors_origins: Vec::new(),
            trusted_proxies: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// State over a pool that never connects; only routes that reject
    /// before touching the database can be exercised.
    fn state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/gamevault_test")
            .unwrap();
        AppState::new(config(), pool).unwrap()
    }

    fn token(state: &AppState, is_admin: bool) -> String {
        let now = Utc::now();
        let user = User {
            id: UserId::new(7),
            username: "player7".to_owned(),
            email: Email::parse("player7@example.com").unwrap(),
            first_name: None,
            last_name: None,
            address: None,
            stripe_customer_id: None,
            is_admin,
            created_at: now,
            updated_at: now,
        };
        state.tokens().issue(&user).unwrap()
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        routes(state.config())
            .with_state(state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }

    fn get(uri: &str) -> axum::http::request::Builder {
        Request::get(uri).extension(ConnectInfo(peer()))
    }

    async fn message(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["message"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn test_health() {
        let state = state();
        let response = send(&state, get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cart_requires_token() {
        let state = state();
        let response = send(&state, get("/api/cart").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(message(response).await, "Authentication required");
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let state = state();
        let response = send(
            &state,
            get("/api/orders")
                .header(AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_routes_forbid_customers() {
        let state = state();
        let customer = token(&state, false);

        for uri in [
            "/api/users",
            "/api/admin/orders",
            "/api/admin/stats/summary",
            "/api/admin/stats/sales",
            "/api/admin/stats/best-sellers",
        ] {
            let response = send(
                &state,
                get(uri)
                    .header(AUTHORIZATION, format!("Bearer {customer}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_admin_product_writes_forbid_customers() {
        let state = state();
        let customer = token(&state, false);

        let response = send(
            &state,
            Request::delete("/api/products/1")
                .extension(ConnectInfo(peer()))
                .header(AUTHORIZATION, format!("Bearer {customer}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            &state,
            Request::delete("/api/products/1")
                .extension(ConnectInfo(peer()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_product_rejected_before_database() {
        let state = state();
        let admin = token(&state, true);

        let response = send(
            &state,
            Request::post("/api/products")
                .extension(ConnectInfo(peer()))
                .header(AUTHORIZATION, format!("Bearer {admin}"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title":"  ","price":"10.00","stock":1}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_json_400() {
        let state = state();
        let response = send(
            &state,
            Request::post("/api/auth/signin")
                .extension(ConnectInfo(peer()))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!message(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_payments_unavailable_without_stripe() {
        let state = state();
        let customer = token(&state, false);

        let response = send(
            &state,
            Request::post("/api/payments/intent")
                .extension(ConnectInfo(peer()))
                .header(AUTHORIZATION, format!("Bearer {customer}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = send(
            &state,
            Request::post("/api/payments/webhook")
                .header("stripe-signature", "t=1,v1=00")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_json_404() {
        let state = state();
        let response = send(&state, get("/api/nope").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(message(response).await, "Route not found");
    }

    #[tokio::test]
    async fn test_unknown_page_renders_not_found() {
        let state = state();
        let response = send(&state, get("/nowhere").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("Page not found"));
    }

    fn signin_from(peer: SocketAddr, forwarded_for: &str) -> Request<Body> {
        Request::post("/api/auth/signin")
            .extension(ConnectInfo(peer))
            .header("x-forwarded-for", forwarded_for)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap()
    }

    /// Statuses of `count` signin attempts, each claiming a fresh forwarded address.
    async fn signin_burst(
        config: StorefrontConfig,
        peer: SocketAddr,
        count: u8,
    ) -> Vec<Response> {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/gamevault_test")
            .unwrap();
        let app = routes(&config).with_state(AppState::new(config, pool).unwrap());

        let mut responses = Vec::new();
        for i in 0..count {
            let request = signin_from(peer, &format!("192.0.2.{i}"));
            responses.push(app.clone().oneshot(request).await.unwrap());
        }
        responses
    }

    #[tokio::test]
    async fn test_auth_rate_limit_ignores_spoofed_forwarded_for() {
        let mut responses = signin_burst(config(), peer(), 6).await;
        let last = responses.pop().unwrap();

        assert!(responses.iter().all(|r| r.status() == StatusCode::BAD_REQUEST));
        assert_eq!(last.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(last.headers().contains_key(RETRY_AFTER));
        assert_eq!(message(last).await, "Too many requests, please slow down");
    }

    #[tokio::test]
    async fn test_auth_rate_limit_keys_on_client_behind_trusted_proxy() {
        let config = StorefrontConfig {
            trusted_proxies: vec![PROXY_IP.parse().unwrap()],
            ..config()
        };
        let proxy = SocketAddr::new(PROXY_IP.parse().unwrap(), 41_000);

        let responses = signin_burst(config, proxy, 6).await;
        assert!(responses.iter().all(|r| r.status() == StatusCode::BAD_REQUEST));
    }
}
