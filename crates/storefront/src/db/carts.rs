//! Cart repository.
//!
//! Carts are rows of `(user_id, product_id, quantity)`; there is no cart
//! entity of its own.

use sqlx::PgPool;

use gamevault_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::CartItem;

/// Foreign key from a cart row to the user owning it.
pub const USER_FOREIGN_KEY: &str = "cart_items_user_id_fkey";

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    product_id: i32,
    quantity: i32,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative cart quantity for product {}",
                row.product_id
            ))
        })?;
        Ok(Self {
            product_id: ProductId::new(row.product_id),
            quantity,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All rows in a user's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT product_id, quantity FROM store.cart_items
            WHERE user_id = $1
            ORDER BY added_at ASC, product_id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartItem::try_from).collect()
    }

    /// Current quantity of one product in a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<u32>, RepositoryError> {
        let quantity = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM store.cart_items WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(quantity.map(|q| u32::try_from(q).unwrap_or(0)))
    }

    /// Insert or overwrite a cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` naming the violated key
    /// if the user or the product no longer exists.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let quantity = i32::try_from(quantity)
            .map_err(|_| RepositoryError::Conflict("quantity out of range".to_owned()))?;

        sqlx::query(
            r"
            INSERT INTO store.cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::from_foreign_key_violation)?;

        Ok(())
    }

    /// Remove one product from a user's cart.
    ///
    /// # Returns
    ///
    /// `true` if the line existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM store.cart_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Empty a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM store.cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
