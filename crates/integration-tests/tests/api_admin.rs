//! Integration tests for admin gating and dashboard statistics.
//!
//! Requires a running server, migrated database and an admin account.

use gamevault_integration_tests::TestContext;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

const ADMIN_ROUTES: &[&str] = &[
    "/api/users",
    "/api/admin/orders",
    "/api/admin/stats/summary",
    "/api/admin/stats/sales",
    "/api/admin/stats/best-sellers",
];

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_admin_routes_gated() {
    let ctx = TestContext::new();
    let customer = ctx.signup().await;

    for path in ADMIN_ROUTES {
        let anonymous = ctx
            .request(Method::GET, path)
            .send()
            .await
            .expect("Request failed");
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED, "{path}");

        let forbidden = ctx
            .authed(Method::GET, path, &customer.token)
            .send()
            .await
            .expect("Request failed");
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN, "{path}");
    }

    let resp = ctx
        .authed(Method::POST, "/api/products", &customer.token)
        .json(&json!({ "title": "Sneaky", "price": "1.00" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_summary_shape() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let body: Value = ctx
        .authed(Method::GET, "/api/admin/stats/summary", &admin)
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid response");

    for key in ["users", "products", "orders"] {
        assert!(body[key].is_i64(), "{key}");
    }
    assert!(body["revenue"].is_string());
    assert!(body["lowStockThreshold"].is_i64());
    assert!(body["lowStock"].is_array());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_sales_days_zero_filled() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let body: Value = ctx
        .authed(Method::GET, "/api/admin/stats/sales?days=7", &admin)
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid response");

    let days = body["days"].as_array().expect("days");
    assert_eq!(days.len(), 7);
    assert_eq!(days.first().map(|d| &d["day"]), Some(&body["from"]));
    assert_eq!(days.last().map(|d| &d["day"]), Some(&body["to"]));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_best_sellers_sorted() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let body: Value = ctx
        .authed(Method::GET, "/api/admin/stats/best-sellers?limit=20", &admin)
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid response");

    let units: Vec<u64> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|e| e["unitsSold"].as_u64())
        .collect();
    assert!(units.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_admin_user_management() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let user = ctx.signup().await;

    let resp = ctx
        .authed(Method::GET, "/api/users?limit=5", &admin)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = resp.json().await.expect("Invalid response");
    assert_eq!(page["limit"], 5);

    let resp = ctx
        .authed(Method::DELETE, &format!("/api/users/{}", user.id), &admin)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ctx
        .authed(Method::GET, &format!("/api/users/{}", user.id), &admin)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
