//! Cart API for the signed-in caller.

use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};

use gamevault_core::ProductId;

use crate::error::{Result, add_breadcrumb};
use crate::extract::{Json, Path};
use crate::middleware::RequireAuth;
use crate::models::CartView;
use crate::models::cart::{AddToCartRequest, SetQuantityRequest};
use crate::services::cart::CartService;
use crate::state::AppState;

/// Build the cart router, mounted at `/api/cart`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show).delete(clear))
        .route("/items", post(add))
        .route("/items/{product_id}", put(set_quantity).delete(remove))
}

/// The caller's cart.
async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool()).view(user.id).await?;
    Ok(Json(cart))
}

/// Add units of a product.
async fn add(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool())
        .add(user.id, request.product_id, request.quantity)
        .await?;

    let product_id = request.product_id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", &product_id)]));
    Ok(Json(cart))
}

/// Set a line's quantity; zero removes it.
async fn set_quantity(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(request): Json<SetQuantityRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool())
        .set_quantity(user.id, product_id, request.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove a line.
async fn remove(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    Ok(Json(cart))
}

/// Empty the cart.
async fn clear(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool()).clear(user.id).await?;
    Ok(Json(cart))
}
