//! Product catalog repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use gamevault_core::{Price, ProductId};

use super::RepositoryError;
use super::stats::UNITS_SOLD_CTE;
use crate::models::product::NewProduct;
use crate::models::{Product, ProductFilter};

const PRODUCT_COLUMNS: &str = "id, title, description, genre, platform, publisher, release_year, \
     price, stock, cover_image_url, screenshot_urls, trailer_url, created_at, updated_at";

/// Catalog filter shared by the listing and its count query.
///
/// `$1` search pattern from [`contains_pattern`] (title or description),
/// `$2` genre, `$3` platform. Genre and platform match exactly, ignoring case.
const FILTER_CLAUSE: &str = r"
    ($1::text IS NULL OR title ILIKE $1 OR description ILIKE $1)
    AND ($2::text IS NULL OR lower(genre) = lower($2))
    AND ($3::text IS NULL OR lower(platform) = lower($3))
";

/// `ILIKE` pattern matching `term` anywhere, with `%`, `_` and `\` in the
/// term taken literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title: String,
    description: String,
    genre: Option<String>,
    platform: Option<String>,
    publisher: Option<String>,
    release_year: Option<i32>,
    price: Decimal,
    stock: i32,
    cover_image_url: Option<String>,
    screenshot_urls: Vec<String>,
    trailer_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            title: row.title,
            description: row.description,
            genre: row.genre,
            platform: row.platform,
            publisher: row.publisher,
            release_year: row.release_year,
            price,
            stock: row.stock,
            cover_image_url: row.cover_image_url,
            screenshot_urls: row.screenshot_urls,
            trailer_url: row.trailer_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List one page of the catalog and the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let search = filter.search.as_deref().map(contains_pattern);

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM store.products
            WHERE {FILTER_CLAUSE}
            ORDER BY {}
            LIMIT $4 OFFSET $5
            ",
            filter.sort.order_by()
        ))
        .bind(search.as_deref())
        .bind(filter.genre.as_deref())
        .bind(filter.platform.as_deref())
        .bind(filter.limit)
        .bind(filter.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM store.products WHERE {FILTER_CLAUSE}"
        ))
        .bind(search.as_deref())
        .bind(filter.genre.as_deref())
        .bind(filter.platform.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok((into_products(rows)?, total))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    /// Fetch several products, returned in the order of `ids`.
    ///
    /// Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM store.products
            WHERE id = ANY($1)
            ORDER BY array_position($1, id)
            "
        ))
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Listed products ranked by units sold, ties broken by ascending id.
    ///
    /// Products never sold are not included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn popular(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            {UNITS_SOLD_CTE}
            SELECT {PRODUCT_COLUMNS}
            FROM units_sold s
            JOIN store.products ON store.products.id = s.product_id
            ORDER BY s.units DESC, s.product_id ASC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Look up a product by exact title (used by seeding).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_title(&self, title: &str) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.products WHERE lower(title) = lower($1) LIMIT 1"
        ))
        .bind(title)
        .fetch_optional(self.pool)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    /// Products at or below a stock threshold, lowest stock first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(
        &self,
        threshold: i32,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM store.products
            WHERE stock <= $1
            ORDER BY stock ASC, id ASC
            LIMIT $2
            "
        ))
        .bind(threshold)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Distinct genres present in the catalog, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn genres(&self) -> Result<Vec<String>, RepositoryError> {
        let genres = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT genre FROM store.products WHERE genre IS NOT NULL ORDER BY genre",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(genres)
    }

    /// Distinct platforms present in the catalog, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn platforms(&self) -> Result<Vec<String>, RepositoryError> {
        let platforms = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT platform FROM store.products WHERE platform IS NOT NULL ORDER BY platform",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(platforms)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO store.products (
                title, description, genre, platform, publisher, release_year,
                price, stock, cover_image_url, screenshot_urls, trailer_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.genre.as_deref())
        .bind(product.platform.as_deref())
        .bind(product.publisher.as_deref())
        .bind(product.release_year)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.cover_image_url.as_deref())
        .bind(&product.screenshot_urls)
        .bind(product.trailer_url.as_deref())
        .fetch_one(self.pool)
        .await?
        .try_into()
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE store.products SET
                title = $2,
                description = $3,
                genre = $4,
                platform = $5,
                publisher = $6,
                release_year = $7,
                price = $8,
                stock = $9,
                cover_image_url = $10,
                screenshot_urls = $11,
                trailer_url = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.genre.as_deref())
        .bind(product.platform.as_deref())
        .bind(product.publisher.as_deref())
        .bind(product.release_year)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.cover_image_url.as_deref())
        .bind(&product.screenshot_urls)
        .bind(product.trailer_url.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// Delete a product. Cart rows referencing it are removed by cascade;
    /// orders keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store.products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM store.products")
            .fetch_one(self.pool)
            .await?;
        Ok(total)
    }
}
