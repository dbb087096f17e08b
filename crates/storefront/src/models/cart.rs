//! Cart types.
//!
//! A cart stores only product ids and quantities. Prices and titles are
//! resolved against the live catalog every time the cart is read.

use serde::{Deserialize, Serialize};

use gamevault_core::{Price, ProductId};

use super::{Product, ValidationError};

/// Most units of a single product allowed in a cart.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// A stored cart row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart line joined with its product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    pub line_total: Price,
}

/// The cart as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: Price,
}

impl CartView {
    /// Build a view from resolved lines.
    #[must_use]
    pub fn new(items: Vec<CartLine>) -> Self {
        let item_count = items.iter().map(|l| l.quantity).sum();
        let subtotal = items.iter().map(|l| l.line_total).sum();
        Self {
            items,
            item_count,
            subtotal,
        }
    }

    /// Join stored rows with products. Rows whose product is gone are dropped.
    #[must_use]
    pub fn resolve(items: &[CartItem], products: &[Product]) -> Self {
        let lines = items
            .iter()
            .filter_map(|item| {
                products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|product| CartLine {
                        line_total: product.price.times(item.quantity),
                        product: product.clone(),
                        quantity: item.quantity,
                    })
            })
            .collect();
        Self::new(lines)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `POST /api/cart/items`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// `PUT /api/cart/items/{productId}`
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

/// Check a resulting line quantity against the cap and available stock.
///
/// # Errors
///
/// Returns [`ValidationError`] when the quantity is zero, above
/// [`MAX_LINE_QUANTITY`] or above the product's stock.
pub fn check_line_quantity(quantity: u32, product: &Product) -> Result<(), ValidationError> {
    if quantity == 0 {
        return Err(ValidationError::new("quantity must be at least 1"));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::new(format!(
            "quantity must be at most {MAX_LINE_QUANTITY}"
        )));
    }
    let available = u32::try_from(product.stock).unwrap_or(0);
    if quantity > available {
        return Err(ValidationError::new(format!(
            "only {available} of '{}' in stock",
            product.title
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(id: i32, cents: i64, stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            title: format!("Game {id}"),
            description: String::new(),
            genre: None,
            platform: None,
            publisher: None,
            release_year: None,
            price: Price::from_cents(cents).unwrap(),
            stock,
            cover_image_url: None,
            screenshot_urls: vec![],
            trailer_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_resolve_computes_totals_and_drops_missing_products() {
        let items = [
            CartItem {
                product_id: ProductId::new(1),
                quantity: 2,
            },
            CartItem {
                product_id: ProductId::new(99),
                quantity: 1,
            },
            CartItem {
                product_id: ProductId::new(2),
                quantity: 1,
            },
        ];
        let products = [product(1, 1999, 5), product(2, 5999, 5)];

        let view = CartView::resolve(&items, &products);

        assert_eq!(view.items.len(), 2);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.items[0].line_total.to_cents(), Some(3998));
        assert_eq!(view.subtotal.to_cents(), Some(9997));
    }

    #[test]
    fn test_check_line_quantity() {
        let p = product(1, 1000, 3);
        assert!(check_line_quantity(3, &p).is_ok());
        assert!(check_line_quantity(0, &p).is_err());
        assert_eq!(
            check_line_quantity(4, &p).unwrap_err().0,
            "only 3 of 'Game 1' in stock"
        );
        let plenty = product(2, 1000, 500);
        assert!(check_line_quantity(MAX_LINE_QUANTITY, &plenty).is_ok());
        assert_eq!(
            check_line_quantity(100, &plenty).unwrap_err().0,
            "quantity must be at most 99"
        );

        // A product that went negative through manual edits holds nothing
        assert!(check_line_quantity(1, &product(3, 1000, -2)).is_err());
    }

    #[test]
    fn test_add_request_defaults_quantity() {
        let req: AddToCartRequest = serde_json::from_str(r#"{"productId":4}"#).unwrap();
        assert_eq!(req.quantity, 1);
        assert_eq!(req.product_id, ProductId::new(4));
    }
}
