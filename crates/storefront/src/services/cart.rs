//! Cart operations.
//!
//! Quantities are checked against the live product on every change; the
//! stored cart never holds more than [`MAX_LINE_QUANTITY`] of a product or
//! more than is in stock at the time of the change.
//!
//! [`MAX_LINE_QUANTITY`]: crate::models::cart::MAX_LINE_QUANTITY

use sqlx::PgPool;
use thiserror::Error;

use gamevault_core::{ProductId, UserId};

use crate::db::carts::USER_FOREIGN_KEY;
use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::cart::check_line_quantity;
use crate::models::{CartView, Product, ValidationError};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The caller's account was deleted while their token is still live.
    #[error("user not found")]
    UserNotFound,

    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Quantity out of range or above stock.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// The user's cart joined with live product data.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, CartError> {
        let items = self.carts.items(user_id).await?;
        let ids: Vec<ProductId> = items.iter().map(|i| i.product_id).collect();
        let products = self.products.get_many(&ids).await?;
        Ok(CartView::resolve(&items, &products))
    }

    /// Add units of a product, incrementing an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` for an unknown product and
    /// `CartError::Validation` when the resulting quantity is not allowed.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartView, CartError> {
        if quantity == 0 {
            return Err(ValidationError::new("quantity must be at least 1").into());
        }
        let product = self.product(product_id).await?;
        let current = self.carts.quantity(user_id, product_id).await?.unwrap_or(0);
        let total = current.saturating_add(quantity);

        check_line_quantity(total, &product)?;
        self.store(user_id, product_id, total).await?;

        tracing::debug!(
            user_id = %user_id,
            product_id = %product_id,
            quantity = total,
            "Cart line added"
        );
        self.view(user_id).await
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` for an unknown product and
    /// `CartError::Validation` when the quantity is not allowed.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartView, CartError> {
        if quantity == 0 {
            return self.remove(user_id, product_id).await;
        }
        let product = self.product(product_id).await?;

        check_line_quantity(quantity, &product)?;
        self.store(user_id, product_id, quantity).await?;

        self.view(user_id).await
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if the line does not exist.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartView, CartError> {
        if !self.carts.remove(user_id, product_id).await? {
            return Err(CartError::NotInCart(product_id));
        }
        self.view(user_id).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<CartView, CartError> {
        self.carts.clear(user_id).await?;
        Ok(CartView::new(Vec::new()))
    }

    async fn product(&self, product_id: ProductId) -> Result<Product, CartError> {
        self.products
            .get_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))
    }

    async fn store(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.carts
            .set_quantity(user_id, product_id, quantity)
            .await
            .map_err(|e| write_error(e, product_id))
    }
}

/// Attribute a failed cart write to whichever row vanished.
fn write_error(err: RepositoryError, product_id: ProductId) -> CartError {
    match err {
        RepositoryError::MissingReference(constraint) if constraint == USER_FOREIGN_KEY => {
            CartError::UserNotFound
        }
        // Deleted between the lookup and the write
        RepositoryError::MissingReference(_) | RepositoryError::NotFound => {
            CartError::ProductNotFound(product_id)
        }
        other => CartError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_names_the_missing_row() {
        let product_id = ProductId::new(7);

        let err = write_error(
            RepositoryError::MissingReference(USER_FOREIGN_KEY.to_owned()),
            product_id,
        );
        assert!(matches!(err, CartError::UserNotFound));

        let err = write_error(
            RepositoryError::MissingReference("cart_items_product_id_fkey".to_owned()),
            product_id,
        );
        assert!(matches!(err, CartError::ProductNotFound(id) if id == product_id));

        let err = write_error(RepositoryError::Conflict("quantity".to_owned()), product_id);
        assert!(matches!(err, CartError::Repository(RepositoryError::Conflict(_))));
    }
}
