//! Gamevault store library.
//!
//! The JSON API, the admin back office endpoints and the server-rendered
//! catalog pages all live here so the binary, the CLI and tests share them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::from_fn,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
const STATIC_DIR: &str = "crates/storefront/static";

/// Build the complete application with its middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origins);

    Router::new()
        .merge(routes::routes(state.config()))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(cors)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for browser clients on other origins. No origins configured means
/// no cross-origin access.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::ACCESS_CONTROL_ALLOW_ORIGIN},
    };
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{AuthConfig, StorefrontConfig};
    use crate::middleware::request_id::REQUEST_ID_HEADER;

    fn state(cors_origins: Vec<String>) -> AppState {
        let config = StorefrontConfig {
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
            cors_origins,
            trusted_proxies: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/gamevault_test")
            .unwrap();
        AppState::new(config, pool).unwrap()
    }

    #[tokio::test]
    async fn test_app_sets_request_id_and_security_headers() {
        let response = app(state(Vec::new()))
            .oneshot(
                Request::get("/health")
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "req-42");
        assert!(response.headers().contains_key("x-frame-options"));
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin_only() {
        let app = app(state(vec!["https://shop.example".to_owned()]));

        let allowed = app
            .clone()
            .oneshot(
                Request::get("/health")
                    .header("origin", "https://shop.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://shop.example"
        );

        let other = app
            .oneshot(
                Request::get("/health")
                    .header("origin", "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(!other.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
