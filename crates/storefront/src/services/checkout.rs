//! Order placement.
//!
//! Turns the caller's cart into an order snapshot. Stock is decremented
//! inside the same transaction that writes the order, so two buyers racing
//! for the last copy cannot both succeed.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use gamevault_core::OrderStatus;

use super::cart::{CartError, CartService};
use super::payments::{PaymentError, PaymentService};
use super::stripe::StripeClient;
use crate::db::orders::NewOrder;
use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::models::order::order_total;
use crate::models::{CreateOrderRequest, CurrentUser, Order, OrderLine, ValidationError};

/// Errors from order placement.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Bad shipping address.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Not enough stock or the payment was already used.
    #[error("{0}")]
    Conflict(String),

    /// The caller no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// Payment verification failed.
    #[error("{0}")]
    Payment(#[from] PaymentError),

    /// Cart lookup failed.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CheckoutError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    stripe: Option<&'a StripeClient>,
}

impl<'a> CheckoutService<'a> {
    /// Create a checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, stripe: Option<&'a StripeClient>) -> Self {
        Self { pool, stripe }
    }

    /// Place an order from the caller's cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart,
    /// `CheckoutError::Conflict` when stock ran out, and
    /// `CheckoutError::Payment` when a supplied payment does not check out.
    #[instrument(skip(self, request), fields(user_id = %user.id))]
    pub async fn place_order(
        &self,
        user: &CurrentUser,
        request: CreateOrderRequest,
    ) -> Result<Order, CheckoutError> {
        let address = request.address.validate()?;

        let cart = CartService::new(self.pool).view(user.id).await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let items = OrderLine::snapshot(&cart);
        let total = order_total(&items);

        let payment_intent_id = request
            .payment_intent_id
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty());

        let status = match &payment_intent_id {
            Some(intent_id) => {
                let account = UserRepository::new(self.pool)
                    .get_by_id(user.id)
                    .await?
                    .ok_or(CheckoutError::UserNotFound)?;
                let intent = PaymentService::new(self.pool, self.stripe)?
                    .verify_intent(intent_id, &account, total)
                    .await?;
                if intent.succeeded() {
                    OrderStatus::Paid
                } else {
                    OrderStatus::Pending
                }
            }
            None => OrderStatus::Pending,
        };

        let order = OrderRepository::new(self.pool)
            .place(NewOrder {
                user_id: user.id,
                items: &items,
                total,
                address: &address,
                payment_intent_id: payment_intent_id.as_deref(),
                status,
            })
            .await?;

        info!(
            order_id = %order.id,
            total = %order.total,
            units = order.units(),
            status = %order.status,
            "Order placed"
        );

        Ok(order)
    }
}
