//! Payment flows on top of the Stripe client.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use gamevault_core::{OrderId, Price, UserId};

use super::cart::{CartError, CartService};
use super::stripe::{IntentResponse, PaymentIntent, PaymentMethod, StripeClient, StripeError};
use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::models::User;

/// Errors from payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Stripe is not configured on this server.
    #[error("payments are not configured")]
    Disabled,

    /// Nothing to pay for.
    #[error("cart is empty")]
    EmptyCart,

    /// The caller no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// A payment intent did not match the order it was presented for.
    #[error("{0}")]
    Rejected(String),

    /// Stripe API failure.
    #[error("stripe error: {0}")]
    Stripe(#[from] StripeError),

    /// Cart lookup failed.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Payment service.
pub struct PaymentService<'a> {
    pool: &'a PgPool,
    stripe: &'a StripeClient,
}

impl<'a> PaymentService<'a> {
    /// Create a payment service, or fail when Stripe is not configured.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Disabled` when `stripe` is `None`.
    pub fn new(pool: &'a PgPool, stripe: Option<&'a StripeClient>) -> Result<Self, PaymentError> {
        match stripe {
            Some(stripe) => Ok(Self { pool, stripe }),
            None => Err(PaymentError::Disabled),
        }
    }

    /// Return the user's Stripe customer id, creating the customer if needed.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Stripe` if customer creation fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn ensure_customer(&self, user: &User) -> Result<String, PaymentError> {
        if let Some(id) = &user.stripe_customer_id {
            return Ok(id.clone());
        }

        let customer = self
            .stripe
            .create_customer(user.id, user.email.as_str(), &user.display_name())
            .await?;
        UserRepository::new(self.pool)
            .set_stripe_customer_id(user.id, &customer.id)
            .await?;

        info!(customer_id = %customer.id, "Stripe customer created");
        Ok(customer.id)
    }

    /// Create a payment intent for the user's current cart total.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::EmptyCart` when there is nothing to pay for.
    #[instrument(skip(self))]
    pub async fn create_intent(&self, user_id: UserId) -> Result<IntentResponse, PaymentError> {
        let user = self.user(user_id).await?;
        let cart = CartService::new(self.pool).view(user_id).await?;
        if cart.is_empty() {
            return Err(PaymentError::EmptyCart);
        }

        let amount = minor_units(cart.subtotal)?;
        let customer_id = self.ensure_customer(&user).await?;
        let intent = self
            .stripe
            .create_payment_intent(amount, &customer_id, user_id)
            .await?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentError::Stripe(StripeError::Parse(
                "payment intent has no client secret".to_owned(),
            ))
        })?;

        info!(payment_intent_id = %intent.id, amount, "Payment intent created");

        Ok(IntentResponse {
            client_secret,
            payment_intent_id: intent.id,
            amount: intent.amount,
            currency: intent.currency,
        })
    }

    /// The user's saved card payment methods. Users without a Stripe
    /// customer have none.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Stripe` if the API request fails.
    pub async fn payment_methods(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PaymentMethod>, PaymentError> {
        let user = self.user(user_id).await?;
        match &user.stripe_customer_id {
            Some(customer_id) => Ok(self.stripe.list_payment_methods(customer_id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Check that a payment intent pays for `total` on behalf of `user`.
    ///
    /// Intents that are still processing are accepted; the order they pay
    /// for stays pending until the webhook reports success.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Rejected` describing the mismatch.
    pub async fn verify_intent(
        &self,
        payment_intent_id: &str,
        user: &User,
        total: Price,
    ) -> Result<PaymentIntent, PaymentError> {
        let intent = self.stripe.retrieve_payment_intent(payment_intent_id).await?;
        check_intent(&intent, user, total, self.stripe.currency())?;
        Ok(intent)
    }

    /// Handle a verified webhook event.
    ///
    /// # Returns
    ///
    /// The order marked paid, if any.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Repository` if the update fails.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.kind))]
    pub async fn handle_event(
        &self,
        event: &super::stripe::Event,
    ) -> Result<Option<OrderId>, PaymentError> {
        if event.kind != "payment_intent.succeeded" {
            tracing::debug!("Ignoring webhook event");
            return Ok(None);
        }
        let Some(intent_id) = event.object_id() else {
            return Ok(None);
        };

        let order_id = OrderRepository::new(self.pool)
            .mark_paid_by_payment_intent(intent_id)
            .await?;
        if let Some(order_id) = order_id {
            info!(order_id = %order_id, payment_intent_id = intent_id, "Order marked paid");
        }
        Ok(order_id)
    }

    async fn user(&self, user_id: UserId) -> Result<User, PaymentError> {
        UserRepository::new(self.pool)
            .get_by_id(user_id)
            .await?
            .ok_or(PaymentError::UserNotFound)
    }
}

/// Price in minor units for the Stripe API.
fn minor_units(price: Price) -> Result<i64, PaymentError> {
    price
        .to_cents()
        .ok_or_else(|| PaymentError::Rejected("amount out of range".to_owned()))
}

/// Compare an intent with the order it should pay for.
fn check_intent(
    intent: &PaymentIntent,
    user: &User,
    total: Price,
    currency: &str,
) -> Result<(), PaymentError> {
    if intent.customer.is_none() || intent.customer != user.stripe_customer_id {
        return Err(PaymentError::Rejected(
            "payment does not belong to this account".to_owned(),
        ));
    }
    if !intent.succeeded() && !intent.processing() {
        return Err(PaymentError::Rejected(format!(
            "payment has not succeeded (status: {})",
            intent.status
        )));
    }
    if intent.amount != minor_units(total)? || !intent.currency.eq_ignore_ascii_case(currency) {
        return Err(PaymentError::Rejected(
            "payment amount does not match order total".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use gamevault_core::Email;

    use super::*;

    fn user(customer: Option<&str>) -> User {
        User {
            id: UserId::new(5),
            username: "samus".into(),
            email: Email::parse("samus@example.com").unwrap(),
            first_name: None,
            last_name: None,
            address: None,
            stripe_customer_id: customer.map(str::to_owned),
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn intent(customer: &str, amount: i64, status: &str) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".into(),
            amount,
            currency: "usd".into(),
            status: status.into(),
            client_secret: None,
            customer: Some(customer.into()),
        }
    }

    #[test]
    fn test_matching_intent_accepted() {
        let total = Price::from_cents(5999).unwrap();
        let result = check_intent(
            &intent("cus_1", 5999, "succeeded"),
            &user(Some("cus_1")),
            total,
            "usd",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_processing_intent_accepted() {
        let total = Price::from_cents(5999).unwrap();
        let processing = intent("cus_1", 5999, "processing");
        assert!(check_intent(&processing, &user(Some("cus_1")), total, "usd").is_ok());
        assert!(!processing.succeeded());
    }

    #[test]
    fn test_intent_mismatches_rejected() {
        let total = Price::from_cents(5999).unwrap();
        let owner = user(Some("cus_1"));

        for bad in [
            intent("cus_2", 5999, "succeeded"),
            intent("cus_1", 5998, "succeeded"),
            intent("cus_1", 5999, "requires_payment_method"),
            intent("cus_1", 5999, "canceled"),
        ] {
            assert!(matches!(
                check_intent(&bad, &owner, total, "usd"),
                Err(PaymentError::Rejected(_))
            ));
        }

        // A user without a customer cannot own any intent
        assert!(
            check_intent(&intent("cus_1", 5999, "succeeded"), &user(None), total, "usd").is_err()
        );
        assert!(
            check_intent(&intent("cus_1", 5999, "succeeded"), &owner, total, "eur").is_err()
        );
    }

    #[tokio::test]
    async fn test_service_requires_stripe() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        assert!(matches!(
            PaymentService::new(&pool, None),
            Err(PaymentError::Disabled)
        ));
    }
}
