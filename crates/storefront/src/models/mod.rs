//! Domain models and API payloads.
//!
//! Domain types are separate from the database row types in [`crate::db`].
//! Request payloads carry a `validate` step that turns loose client input into
//! values the repositories accept.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

use serde::Serialize;
use thiserror::Error;

pub use cart::{CartItem, CartLine, CartView};
pub use order::{CreateOrderRequest, Order, OrderLine, UpdateOrderStatusRequest};
pub use product::{Product, ProductFilter, ProductInput, ProductPatch, ProductQuery, ProductSort};
pub use user::{CurrentUser, ShippingAddress, User};

/// A client payload failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    /// Wrap a page of results.
    #[must_use]
    pub fn new(items: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
        Self {
            items,
            page,
            limit,
            total,
            total_pages: crate::db::total_pages(total, limit),
        }
    }
}

/// Page/limit query parameters shared by admin listings.
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Default page size.
    pub const DEFAULT_LIMIT: i64 = 20;
    /// Largest page size a client may ask for.
    pub const MAX_LIMIT: i64 = 100;

    /// 1-based page number, clamped to at least 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Row offset for SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// Trim an optional string, turning blank input into `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Check that a media URL is an absolute `http(s)` URL.
pub(crate) fn validate_media_url(field: &str, value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new(format!(
            "{field} must be an http(s) URL"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_clamps() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), PageQuery::MAX_LIMIT);
        assert_eq!(q.offset(), 0);

        let q = PageQuery {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" Nintendo ".into())), Some("Nintendo".into()));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_validate_media_url() {
        assert!(validate_media_url("coverImageUrl", "https://cdn.example.com/a.jpg").is_ok());
        assert!(validate_media_url("coverImageUrl", "javascript:alert(1)").is_err());
        assert!(validate_media_url("coverImageUrl", "not a url").is_err());
    }

    #[test]
    fn test_paginated_computes_total_pages() {
        let page = Paginated::new(vec![1, 2, 3], 1, 3, 7);
        assert_eq!(page.total_pages, 3);
    }
}
