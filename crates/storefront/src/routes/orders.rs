//! Order placement, order history and admin order management.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
};

use gamevault_core::OrderId;

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::order::AdminOrderQuery;
use crate::models::{CreateOrderRequest, Order, Paginated, UpdateOrderStatusRequest};
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// Build the customer order router, mounted at `/api/orders`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(mine).post(place))
        .route("/{id}", get(show))
}

/// Build the admin order router, mounted at `/api/admin/orders`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}/status", put(update_status))
        .route("/{id}", delete(remove))
}

/// Turn the caller's cart into an order.
async fn place(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = CheckoutService::new(state.pool(), state.stripe())
        .place_order(&user, request)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// The caller's orders, newest first.
async fn mine(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// A single order. Other customers' orders look missing.
async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .filter(|order| user.is_admin || order.user_id == user.id)
        .ok_or_else(|| order_not_found(id))?;
    Ok(Json(order))
}

/// One page of all orders.
async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AdminOrderQuery>,
) -> Result<Json<Paginated<Order>>> {
    let paging = query.paging();
    let (orders, total) = OrderRepository::new(state.pool())
        .list(query.status, paging.limit(), paging.offset())
        .await?;
    Ok(Json(Paginated::new(orders, paging.page(), paging.limit(), total)))
}

/// Move an order to another status.
async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, request.status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => order_not_found(id),
            other => other.into(),
        })?;

    tracing::info!(
        admin_id = %admin.id,
        order_id = %id,
        status = %order.status,
        "Order status changed"
    );
    Ok(Json(order))
}

/// Delete an order.
async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    if !OrderRepository::new(state.pool()).delete(id).await? {
        return Err(order_not_found(id));
    }
    tracing::info!(admin_id = %admin.id, order_id = %id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn order_not_found(id: OrderId) -> AppError {
    AppError::NotFound(format!("Order {id} not found"))
}
