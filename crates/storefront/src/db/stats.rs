//! Read-only queries behind the admin dashboard and best-seller lists.
//!
//! Per-day aggregation lives in [`gamevault_core::sales`]; best-seller
//! ranking happens in SQL so only the requested rows leave the database.
//! Cancelled orders never count.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use gamevault_core::sales::SaleRecord;
use gamevault_core::{Price, ProductId};

use super::RepositoryError;

/// Headline counters for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTotals {
    pub users: i64,
    pub products: i64,
    pub orders: i64,
    pub revenue: Price,
}

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    users: i64,
    products: i64,
    orders: i64,
    revenue: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    created_at: DateTime<Utc>,
    units: i64,
    total: Decimal,
}

/// `units_sold (product_id, units)`: units per product over every
/// non-cancelled order snapshot. Prefix to a query that ranks by it.
pub(crate) const UNITS_SOLD_CTE: &str = r#"
    WITH units_sold AS (
        SELECT line."productId" AS product_id, SUM(line.quantity)::bigint AS units
        FROM store.orders o,
             jsonb_to_recordset(o.items) AS line("productId" int, quantity int)
        WHERE o.status <> 'cancelled' AND line.quantity > 0
        GROUP BY line."productId"
    )
"#;

/// Units sold of one product, with its title while it is still listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub title: Option<String>,
    pub units_sold: u64,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductSalesRow {
    product_id: i32,
    title: Option<String>,
    units: i64,
}

/// Repository for aggregate reads.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// User, product and order counts plus revenue from non-cancelled orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(&self) -> Result<StoreTotals, RepositoryError> {
        let row = sqlx::query_as::<_, TotalsRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM store.users) AS users,
                (SELECT COUNT(*) FROM store.products) AS products,
                (SELECT COUNT(*) FROM store.orders) AS orders,
                (SELECT COALESCE(SUM(total), 0) FROM store.orders
                    WHERE status <> 'cancelled') AS revenue
            ",
        )
        .fetch_one(self.pool)
        .await?;

        let revenue = Price::new(row.revenue.round_dp(2))
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid revenue: {e}")))?;

        Ok(StoreTotals {
            users: row.users,
            products: row.products,
            orders: row.orders,
            revenue,
        })
    }

    /// Per-order figures for orders placed at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sale_records(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r"
            SELECT
                o.created_at,
                COALESCE((
                    SELECT SUM((line->>'quantity')::bigint)
                    FROM jsonb_array_elements(o.items) AS line
                ), 0)::bigint AS units,
                o.total
            FROM store.orders o
            WHERE o.status <> 'cancelled' AND o.created_at >= $1
            ORDER BY o.created_at ASC
            ",
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let total = Price::new(row.total).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid order total: {e}"))
                })?;
                Ok(SaleRecord {
                    placed_at: row.created_at,
                    units: u32::try_from(row.units).unwrap_or(u32::MAX),
                    total,
                })
            })
            .collect()
    }

    /// Top `limit` products by units sold, ties broken by ascending id.
    ///
    /// Ids come from the order snapshots, so products since deleted still
    /// rank here with no title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn best_sellers(&self, limit: i64) -> Result<Vec<ProductSales>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductSalesRow>(&format!(
            r"
            {UNITS_SOLD_CTE}
            SELECT s.product_id, p.title, s.units
            FROM units_sold s
            LEFT JOIN store.products p ON p.id = s.product_id
            ORDER BY s.units DESC, s.product_id ASC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductSales {
                product_id: ProductId::new(row.product_id),
                title: row.title,
                units_sold: u64::try_from(row.units).unwrap_or(0),
            })
            .collect())
    }
}
