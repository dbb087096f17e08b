//! Admin dashboard statistics.

use axum::{Router, extract::State, routing::get};

use crate::error::Result;
use crate::extract::{Json, Query};
use crate::middleware::RequireAdmin;
use crate::models::product::PopularQuery;
use crate::services::stats::{BestSellerEntry, SalesQuery, SalesReport, StatsService, StoreSummary};
use crate::state::AppState;

/// Build the stats router, mounted at `/api/admin/stats`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/sales", get(sales))
        .route("/best-sellers", get(best_sellers))
}

/// Store-wide counts, revenue and low-stock products.
async fn summary(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<StoreSummary>> {
    let summary = StatsService::new(state.pool())
        .summary(state.config().low_stock_threshold)
        .await?;
    Ok(Json(summary))
}

/// Daily sales for the last `days` days.
async fn sales(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> Result<Json<SalesReport>> {
    let report = StatsService::new(state.pool()).sales(query.days()).await?;
    Ok(Json(report))
}

/// Best sellers with units sold, including products no longer listed.
async fn best_sellers(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<BestSellerEntry>>> {
    let entries = StatsService::new(state.pool())
        .best_sellers(query.limit())
        .await?;
    Ok(Json(entries))
}
