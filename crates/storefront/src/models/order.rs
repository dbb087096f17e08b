//! Order types.
//!
//! An order is a snapshot: line items copy the title and unit price at the
//! time of purchase, so later catalog edits never rewrite order history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gamevault_core::{OrderId, OrderStatus, Price, ProductId, UserId};

use super::{CartView, ShippingAddress};

/// One purchased line, frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl OrderLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    /// Snapshot every line of a resolved cart.
    #[must_use]
    pub fn snapshot(cart: &CartView) -> Vec<Self> {
        cart.items
            .iter()
            .map(|line| Self {
                product_id: line.product.id,
                title: line.product.title.clone(),
                unit_price: line.product.price,
                quantity: line.quantity,
                cover_image_url: line.product.cover_image_url.clone(),
            })
            .collect()
    }
}

/// A placed order (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
    pub total: Price,
    pub address: ShippingAddress,
    pub payment_intent_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Total units across all lines.
    #[must_use]
    pub fn units(&self) -> u32 {
        self.items.iter().map(|l| l.quantity).sum()
    }
}

/// Sum of line totals.
#[must_use]
pub fn order_total(lines: &[OrderLine]) -> Price {
    lines.iter().map(OrderLine::line_total).sum()
}

/// `POST /api/orders`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub address: ShippingAddress,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// `PUT /api/admin/orders/{id}/status`
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Query string for the admin order listing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AdminOrderQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<OrderStatus>,
}

impl AdminOrderQuery {
    /// Page/limit part of the query.
    #[must_use]
    pub const fn paging(&self) -> super::PageQuery {
        super::PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}
