//! Catalog API: public browsing plus admin product management.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use gamevault_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::models::product::PopularQuery;
use crate::models::{Paginated, Product, ProductFilter, ProductInput, ProductPatch, ProductQuery};
use crate::services::stats::StatsService;
use crate::state::AppState;

/// Build the products router, mounted at `/api/products`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/popular", get(popular))
        .route("/{id}", get(show).put(update).delete(remove))
}

/// One page of the catalog.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Paginated<Product>>> {
    let filter = ProductFilter::from(query);
    let (products, total) = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(Paginated::new(products, filter.page, filter.limit, total)))
}

/// Best sellers still in the catalog.
async fn popular(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = StatsService::new(state.pool())
        .popular_products(query.limit())
        .await?;
    Ok(Json(products))
}

/// A single product.
async fn show(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| product_not_found(id))?;
    Ok(Json(product))
}

/// Add a product to the catalog.
async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = input.validate()?;
    let created = ProductRepository::new(state.pool()).create(&product).await?;

    tracing::info!(
        admin_id = %admin.id,
        product_id = %created.id,
        title = %created.title,
        "Product created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update some or all fields of a product.
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>> {
    let repo = ProductRepository::new(state.pool());
    let current = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| product_not_found(id))?;

    let product = patch.apply(&current).validate()?;
    let updated = repo.update(id, &product).await.map_err(|e| match e {
        RepositoryError::NotFound => product_not_found(id),
        other => other.into(),
    })?;

    tracing::info!(admin_id = %admin.id, product_id = %id, "Product updated");
    Ok(Json(updated))
}

/// Remove a product from the catalog.
async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(product_not_found(id));
    }
    tracing::info!(admin_id = %admin.id, product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn product_not_found(id: ProductId) -> AppError {
    AppError::NotFound(format!("Product {id} not found"))
}
