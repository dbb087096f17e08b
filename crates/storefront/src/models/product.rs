//! Catalog domain types and admin payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use gamevault_core::{Price, ProductId};

use super::{ValidationError, non_blank, validate_media_url};

const MAX_TITLE_LENGTH: usize = 200;

/// Exclusive upper bound on a catalog price (the column is `NUMERIC(10, 2)`).
const PRICE_CEILING: i64 = 100_000_000;
const MAX_SCREENSHOTS: usize = 20;

/// A game in the catalog (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub publisher: Option<String>,
    pub release_year: Option<i32>,
    pub price: Price,
    pub stock: i32,
    pub cover_image_url: Option<String>,
    pub screenshot_urls: Vec<String>,
    pub trailer_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether at least one unit can be sold.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Product fields as sent by an admin client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub publisher: Option<String>,
    pub release_year: Option<i32>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub screenshot_urls: Vec<String>,
    pub trailer_url: Option<String>,
}

/// Validated product fields, ready to insert or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub publisher: Option<String>,
    pub release_year: Option<i32>,
    pub price: Price,
    pub stock: i32,
    pub cover_image_url: Option<String>,
    pub screenshot_urls: Vec<String>,
    pub trailer_url: Option<String>,
}

impl ProductInput {
    /// Validate and normalise.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] describing the first invalid field.
    pub fn validate(self) -> Result<NewProduct, ValidationError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(ValidationError::new("title is required"));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ValidationError::new(format!(
                "title must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }

        let price = Price::new(self.price).map_err(|e| ValidationError::new(e.to_string()))?;
        if price.amount() >= Decimal::from(PRICE_CEILING) {
            return Err(ValidationError::new(format!(
                "price must be less than {PRICE_CEILING}"
            )));
        }

        if self.stock < 0 {
            return Err(ValidationError::new("stock cannot be negative"));
        }

        if let Some(year) = self.release_year
            && !(1950..=2100).contains(&year)
        {
            return Err(ValidationError::new("releaseYear is out of range"));
        }

        let cover_image_url = non_blank(self.cover_image_url);
        if let Some(url) = &cover_image_url {
            validate_media_url("coverImageUrl", url)?;
        }
        let trailer_url = non_blank(self.trailer_url);
        if let Some(url) = &trailer_url {
            validate_media_url("trailerUrl", url)?;
        }

        let screenshot_urls: Vec<String> = self
            .screenshot_urls
            .into_iter()
            .map(|u| u.trim().to_owned())
            .filter(|u| !u.is_empty())
            .collect();
        if screenshot_urls.len() > MAX_SCREENSHOTS {
            return Err(ValidationError::new(format!(
                "at most {MAX_SCREENSHOTS} screenshots allowed"
            )));
        }
        for url in &screenshot_urls {
            validate_media_url("screenshotUrls", url)?;
        }

        Ok(NewProduct {
            title,
            description: self.description.trim().to_owned(),
            genre: non_blank(self.genre),
            platform: non_blank(self.platform),
            publisher: non_blank(self.publisher),
            release_year: self.release_year,
            price,
            stock: self.stock,
            cover_image_url,
            screenshot_urls,
            trailer_url,
        })
    }
}

/// Partial update sent to `PUT /api/products/{id}`.
///
/// Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub publisher: Option<String>,
    pub release_year: Option<i32>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub cover_image_url: Option<String>,
    pub screenshot_urls: Option<Vec<String>>,
    pub trailer_url: Option<String>,
}

impl ProductPatch {
    /// Overlay the patch on an existing product.
    #[must_use]
    pub fn apply(self, current: &Product) -> ProductInput {
        ProductInput {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            genre: self.genre.or_else(|| current.genre.clone()),
            platform: self.platform.or_else(|| current.platform.clone()),
            publisher: self.publisher.or_else(|| current.publisher.clone()),
            release_year: self.release_year.or(current.release_year),
            price: self.price.unwrap_or_else(|| current.price.amount()),
            stock: self.stock.unwrap_or(current.stock),
            cover_image_url: self
                .cover_image_url
                .or_else(|| current.cover_image_url.clone()),
            screenshot_urls: self
                .screenshot_urls
                .unwrap_or_else(|| current.screenshot_urls.clone()),
            trailer_url: self.trailer_url.or_else(|| current.trailer_url.clone()),
        }
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Catalog sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Title,
}

impl ProductSort {
    /// SQL `ORDER BY` clause. Always ends on `id` so paging is stable.
    #[must_use]
    pub const fn order_by(&self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::PriceAsc => "price ASC, id ASC",
            Self::PriceDesc => "price DESC, id ASC",
            Self::Title => "lower(title) ASC, id ASC",
        }
    }
}

/// Query string accepted by catalog listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub sort: Option<ProductSort>,
}

/// Normalised catalog filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub sort: ProductSort,
    pub page: i64,
    pub limit: i64,
}

impl ProductFilter {
    /// Default catalog page size.
    pub const DEFAULT_LIMIT: i64 = 12;
    /// Largest page size a client may ask for.
    pub const MAX_LIMIT: i64 = 100;

    /// Row offset for SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            search: non_blank(query.search),
            genre: non_blank(query.genre),
            platform: non_blank(query.platform),
            sort: query.sort.unwrap_or_default(),
            page: query.page.unwrap_or(1).max(1),
            limit: query
                .limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }
}

/// Query string for best-seller listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<usize>,
}

impl PopularQuery {
    /// Default number of best sellers.
    pub const DEFAULT_LIMIT: usize = 8;
    /// Upper bound on best sellers per request.
    pub const MAX_LIMIT: usize = 50;

    /// Requested limit, clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}
