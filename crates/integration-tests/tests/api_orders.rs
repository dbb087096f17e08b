//! Integration tests for the cart and order flow.
//!
//! Requires a running server, migrated database and an admin account.

use gamevault_integration_tests::{
    TestContext, address, attach_payment_intent, stripe_signature, webhook_secret,
};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Add `quantity` of a product to the cart and return the response.
async fn add_to_cart(
    ctx: &TestContext,
    token: &str,
    product_id: i64,
    quantity: u32,
) -> reqwest::Response {
    ctx.authed(Method::POST, "/api/cart/items", token)
        .json(&json!({ "productId": product_id, "quantity": quantity }))
        .send()
        .await
        .expect("Failed to add to cart")
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_cart_to_order_decrements_stock() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let user = ctx.signup().await;

    let product = ctx.create_product(&admin, "12.50", 3).await;
    let product_id = product["id"].as_i64().expect("product id");

    let resp = ctx
        .authed(Method::POST, "/api/cart/items", &user.token)
        .json(&json!({ "productId": product_id, "quantity": 2 }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("Invalid response");
    assert_eq!(cart["subtotal"], "25.00");

    let resp = ctx
        .authed(Method::POST, "/api/orders", &user.token)
        .json(&json!({ "address": address() }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("Invalid response");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total"], "25.00");

    let resp = ctx
        .request(Method::GET, &format!("/api/products/{product_id}"))
        .send()
        .await
        .expect("Failed to get product");
    let after: Value = resp.json().await.expect("Invalid response");
    assert_eq!(after["stock"], 1);

    let resp = ctx
        .authed(Method::GET, "/api/cart", &user.token)
        .send()
        .await
        .expect("Failed to get cart");
    let cart: Value = resp.json().await.expect("Invalid response");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));

    ctx.delete_product(&admin, product_id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_empty_cart_order_rejected() {
    let ctx = TestContext::new();
    let user = ctx.signup().await;

    let resp = ctx
        .authed(Method::POST, "/api/orders", &user.token)
        .json(&json!({ "address": address() }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_stock_shortfall_conflicts() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let first = ctx.signup().await;
    let second = ctx.signup().await;

    let product = ctx.create_product(&admin, "30.00", 1).await;
    let product_id = product["id"].as_i64().expect("product id");

    for user in [&first, &second] {
        let resp = ctx
            .authed(Method::POST, "/api/cart/items", &user.token)
            .json(&json!({ "productId": product_id, "quantity": 1 }))
            .send()
            .await
            .expect("Failed to add to cart");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = ctx
        .authed(Method::POST, "/api/orders", &first.token)
        .json(&json!({ "address": address() }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = ctx
        .authed(Method::POST, "/api/orders", &second.token)
        .json(&json!({ "address": address() }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    ctx.delete_product(&admin, product_id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_orders_private_to_owner() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let owner = ctx.signup().await;
    let other = ctx.signup().await;

    let product = ctx.create_product(&admin, "9.99", 5).await;
    let product_id = product["id"].as_i64().expect("product id");

    ctx.authed(Method::POST, "/api/cart/items", &owner.token)
        .json(&json!({ "productId": product_id }))
        .send()
        .await
        .expect("Failed to add to cart");
    let order: Value = ctx
        .authed(Method::POST, "/api/orders", &owner.token)
        .json(&json!({ "address": address() }))
        .send()
        .await
        .expect("Failed to place order")
        .json()
        .await
        .expect("Invalid response");
    let order_id = order["id"].as_i64().expect("order id");

    let resp = ctx
        .authed(Method::GET, &format!("/api/orders/{order_id}"), &other.token)
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ctx
        .authed(Method::GET, &format!("/api/orders/{order_id}"), &admin)
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::OK);

    ctx.delete_product(&admin, product_id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_cart_add_increments_existing_line() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let user = ctx.signup().await;

    let product = ctx.create_product(&admin, "5.00", 10).await;
    let product_id = product["id"].as_i64().expect("product id");

    assert_eq!(add_to_cart(&ctx, &user.token, product_id, 2).await.status(), StatusCode::OK);
    let resp = add_to_cart(&ctx, &user.token, product_id, 3).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cart: Value = resp.json().await.expect("Invalid response");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["quantity"], 5);
    assert_eq!(cart["itemCount"], 5);
    assert_eq!(cart["subtotal"], "25.00");

    ctx.delete_product(&admin, product_id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_cart_quantity_bounds() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let user = ctx.signup().await;

    let plenty = ctx.create_product(&admin, "1.00", 500).await;
    let plenty_id = plenty["id"].as_i64().expect("product id");
    let scarce = ctx.create_product(&admin, "1.00", 2).await;
    let scarce_id = scarce["id"].as_i64().expect("product id");

    // Above the per-line cap
    let resp = add_to_cart(&ctx, &user.token, plenty_id, 100).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Above stock, including through an increment
    let resp = add_to_cart(&ctx, &user.token, scarce_id, 3).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(add_to_cart(&ctx, &user.token, scarce_id, 2).await.status(), StatusCode::OK);
    let resp = add_to_cart(&ctx, &user.token, scarce_id, 1).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .authed(Method::PUT, &format!("/api/cart/items/{scarce_id}"), &user.token)
        .json(&json!({ "quantity": 3 }))
        .send()
        .await
        .expect("Failed to set quantity");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Rejected changes leave the cart as it was
    let cart: Value = ctx
        .authed(Method::GET, "/api/cart", &user.token)
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Invalid response");
    assert_eq!(cart["itemCount"], 2);

    ctx.delete_product(&admin, plenty_id).await;
    ctx.delete_product(&admin, scarce_id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_cart_set_zero_removes_line() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let user = ctx.signup().await;

    let product = ctx.create_product(&admin, "7.00", 5).await;
    let product_id = product["id"].as_i64().expect("product id");
    assert_eq!(add_to_cart(&ctx, &user.token, product_id, 2).await.status(), StatusCode::OK);

    let resp = ctx
        .authed(Method::PUT, &format!("/api/cart/items/{product_id}"), &user.token)
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .expect("Failed to set quantity");
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("Invalid response");
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));

    // The line is gone, so removing it again finds nothing
    let resp = ctx
        .authed(Method::DELETE, &format!("/api/cart/items/{product_id}"), &user.token)
        .send()
        .await
        .expect("Failed to remove line");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    ctx.delete_product(&admin, product_id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_cart_unknown_product_not_found() {
    let ctx = TestContext::new();
    let user = ctx.signup().await;

    let resp = add_to_cart(&ctx, &user.token, i64::from(i32::MAX), 1).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ctx
        .authed(Method::PUT, &format!("/api/cart/items/{}", i32::MAX), &user.token)
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .expect("Failed to set quantity");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server, database and a Stripe webhook secret"]
#[allow(clippy::print_stderr)]
async fn test_succeeded_webhook_marks_order_paid() {
    let Some(secret) = webhook_secret() else {
        eprintln!("GAMEVAULT_TEST_STRIPE_WEBHOOK_SECRET not set, skipping");
        return;
    };
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let user = ctx.signup().await;

    let product = ctx.create_product(&admin, "19.99", 3).await;
    let product_id = product["id"].as_i64().expect("product id");
    assert_eq!(add_to_cart(&ctx, &user.token, product_id, 1).await.status(), StatusCode::OK);

    let order: Value = ctx
        .authed(Method::POST, "/api/orders", &user.token)
        .json(&json!({ "address": address() }))
        .send()
        .await
        .expect("Failed to place order")
        .json()
        .await
        .expect("Invalid response");
    let order_id = order["id"].as_i64().expect("order id");
    assert_eq!(order["status"], "pending");

    let intent_id = format!("pi_it_{}", Uuid::new_v4().simple());
    attach_payment_intent(order_id, &intent_id).await;

    let send_event = |payload: String, signature: String| {
        ctx.request(Method::POST, "/api/payments/webhook")
            .header("stripe-signature", signature)
            .header("content-type", "application/json")
            .body(payload)
            .send()
    };

    let payload = json!({
        "id": format!("evt_{}", Uuid::new_v4().simple()),
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": intent_id, "object": "payment_intent" } },
    })
    .to_string();

    // A forged signature changes nothing
    let resp = send_event(payload.clone(), stripe_signature("whsec_wrong", &payload))
        .await
        .expect("Failed to send webhook");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send_event(payload.clone(), stripe_signature(&secret, &payload))
        .await
        .expect("Failed to send webhook");
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: Value = resp.json().await.expect("Invalid response");
    assert_eq!(ack["received"], true);

    let order: Value = ctx
        .authed(Method::GET, &format!("/api/orders/{order_id}"), &user.token)
        .send()
        .await
        .expect("Failed to get order")
        .json()
        .await
        .expect("Invalid response");
    assert_eq!(order["status"], "paid");

    ctx.delete_product(&admin, product_id).await;
}
