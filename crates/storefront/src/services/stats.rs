//! Admin dashboard figures and best-seller rankings.

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use gamevault_core::sales::{self, DailySales};
use gamevault_core::{Price, ProductId};

use crate::db::{ProductRepository, RepositoryError, StatsRepository};
use crate::models::Product;

/// Most low-stock products listed on the summary.
const LOW_STOCK_LIMIT: i64 = 20;

/// `GET /api/admin/stats/summary`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub users: i64,
    pub products: i64,
    pub orders: i64,
    pub revenue: Price,
    pub low_stock_threshold: i32,
    pub low_stock: Vec<LowStockItem>,
}

/// A product running out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockItem {
    pub id: ProductId,
    pub title: String,
    pub stock: i32,
}

/// Query string for `GET /api/admin/stats/sales`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SalesQuery {
    pub days: Option<u32>,
}

impl SalesQuery {
    /// Default window.
    pub const DEFAULT_DAYS: u32 = 30;
    /// Longest window.
    pub const MAX_DAYS: u32 = 365;

    /// Requested window clamped to `1..=MAX_DAYS`.
    #[must_use]
    pub fn days(&self) -> u32 {
        self.days
            .unwrap_or(Self::DEFAULT_DAYS)
            .clamp(1, Self::MAX_DAYS)
    }
}

/// `GET /api/admin/stats/sales`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: Vec<DailySales>,
}

/// One row of the admin best-seller table.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestSellerEntry {
    pub product_id: ProductId,
    /// `None` once the product has left the catalog.
    pub title: Option<String>,
    pub units_sold: u64,
}

/// Statistics service.
pub struct StatsService<'a> {
    stats: StatsRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> StatsService<'a> {
    /// Create a statistics service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            stats: StatsRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Headline counts, revenue and low-stock products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn summary(&self, low_stock_threshold: i32) -> Result<StoreSummary, RepositoryError> {
        let totals = self.stats.totals().await?;
        let low_stock = self
            .products
            .low_stock(low_stock_threshold, LOW_STOCK_LIMIT)
            .await?
            .into_iter()
            .map(|p| LowStockItem {
                id: p.id,
                title: p.title,
                stock: p.stock,
            })
            .collect();

        Ok(StoreSummary {
            users: totals.users,
            products: totals.products,
            orders: totals.orders,
            revenue: totals.revenue,
            low_stock_threshold,
            low_stock,
        })
    }

    /// Per-day sales for the last `days` UTC days, today included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn sales(&self, days: u32) -> Result<SalesReport, RepositoryError> {
        let to = Utc::now().date_naive();
        let from = to
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN);
        let since = from.and_time(NaiveTime::MIN).and_utc();

        let records = self.stats.sale_records(since).await?;

        Ok(SalesReport {
            from,
            to,
            days: sales::daily_sales(records, to, days),
        })
    }

    /// Top sellers by units, including products since removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn best_sellers(
        &self,
        limit: usize,
    ) -> Result<Vec<BestSellerEntry>, RepositoryError> {
        Ok(self
            .stats
            .best_sellers(sql_limit(limit))
            .await?
            .into_iter()
            .map(|sold| BestSellerEntry {
                product_id: sold.product_id,
                title: sold.title,
                units_sold: sold.units_sold,
            })
            .collect())
    }

    /// Top sellers still in the catalog, best first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn popular_products(&self, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        self.products.popular(sql_limit(limit)).await
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
