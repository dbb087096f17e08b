//! Order repository.
//!
//! Placing an order is the one multi-statement write in the store: stock is
//! decremented, the order inserted and the cart cleared in a single
//! transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use gamevault_core::{OrderId, OrderStatus, Price, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderLine, ShippingAddress};

const ORDER_COLUMNS: &str =
    "id, user_id, items, total, address, payment_intent_id, status, created_at";

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    items: Json<Vec<OrderLine>>,
    total: Decimal,
    address: Json<ShippingAddress>,
    payment_intent_id: Option<String>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let total = Price::new(row.total).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid total for order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            items: row.items.0,
            total,
            address: row.address.0,
            payment_intent_id: row.payment_intent_id,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
    rows.into_iter().map(Order::try_from).collect()
}

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub items: &'a [OrderLine],
    pub total: Price,
    pub address: &'a ShippingAddress,
    pub payment_intent_id: Option<&'a str>,
    pub status: OrderStatus,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order.
    ///
    /// Each line's stock is decremented only if enough remains. If any line
    /// falls short the transaction is rolled back and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` naming the first product without
    /// enough stock, or when the payment intent was already used.
    pub async fn place(&self, order: NewOrder<'_>) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for line in order.items {
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| RepositoryError::Conflict("quantity out of range".to_owned()))?;

            let updated = sqlx::query(
                r"
                UPDATE store.products
                SET stock = stock - $2, updated_at = NOW()
                WHERE id = $1 AND stock >= $2
                ",
            )
            .bind(line.product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "not enough stock for '{}'",
                    line.title
                )));
            }
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO store.orders (user_id, items, total, address, payment_intent_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(Json(order.items))
        .bind(order.total)
        .bind(Json(order.address))
        .bind(order.payment_intent_id)
        .bind(order.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            RepositoryError::from_unique_violation(e, "payment already used for another order")
        })?;

        sqlx::query("DELETE FROM store.cart_items WHERE user_id = $1")
            .bind(order.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Order::try_from)
        .transpose()
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM store.orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        into_orders(rows)
    }

    /// One page of all orders, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let status = status.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM store.orders
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM store.orders WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok((into_orders(rows)?, total))
    }

    /// Change an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE store.orders SET status = $2
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// Mark the pending order paid by a payment intent as `paid`.
    ///
    /// # Returns
    ///
    /// The order id, or `None` when no pending order references the intent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_paid_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<OrderId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, OrderId>(
            r"
            UPDATE store.orders SET status = 'paid'
            WHERE payment_intent_id = $1 AND status = 'pending'
            RETURNING id
            ",
        )
        .bind(payment_intent_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(id)
    }

    /// Delete an order. Stock is not restored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store.orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
