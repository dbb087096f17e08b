//! Stripe REST API client.
//!
//! Form-encoded requests against the Stripe API for customers, payment
//! intents and saved payment methods, plus webhook verification.

pub mod types;
pub mod webhook;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};

use gamevault_core::UserId;

use crate::config::StripeConfig;

pub use types::{Customer, Event, IntentResponse, PaymentIntent, PaymentMethod};

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Webhook signature did not verify.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// No webhook signing secret is configured.
    #[error("webhook secret not configured")]
    WebhookNotConfigured,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    currency: String,
    webhook_secret: Option<SecretString>,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new Stripe API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, StripeError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| StripeError::Parse(format!("Invalid API key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert("Authorization", auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            currency: config.currency.clone(),
            webhook_secret: config.webhook_secret.clone(),
        })
    }

    /// Currency used for new payment intents.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Create a customer for a store user.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, email, name))]
    pub async fn create_customer(
        &self,
        user_id: UserId,
        email: &str,
        name: &str,
    ) -> Result<Customer, StripeError> {
        let user_id = user_id.to_string();
        let form = [
            ("email", email),
            ("name", name),
            ("metadata[user_id]", user_id.as_str()),
        ];
        self.post_form("/v1/customers", &form).await
    }

    /// Create a payment intent for `amount` minor units.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        customer_id: &str,
        user_id: UserId,
    ) -> Result<PaymentIntent, StripeError> {
        let amount = amount.to_string();
        let user_id = user_id.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", self.currency.as_str()),
            ("customer", customer_id),
            ("automatic_payment_methods[enabled]", "true"),
            ("metadata[user_id]", user_id.as_str()),
        ];
        self.post_form("/v1/payment_intents", &form).await
    }

    /// Fetch a payment intent.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, StripeError> {
        self.get(&format!("/v1/payment_intents/{id}"), &[]).await
    }

    /// List a customer's saved card payment methods.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<Vec<PaymentMethod>, StripeError> {
        let list: types::List<PaymentMethod> = self
            .get(
                &format!("/v1/customers/{customer_id}/payment_methods"),
                &[("type", "card")],
            )
            .await?;
        Ok(list.data)
    }

    /// Verify a webhook payload and parse the event.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::WebhookNotConfigured` without a signing secret,
    /// `StripeError::InvalidSignature` if verification fails.
    pub fn construct_event(&self, payload: &str, signature: &str) -> Result<Event, StripeError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or(StripeError::WebhookNotConfigured)?;

        webhook::verify_signature(
            secret.expose_secret(),
            payload,
            signature,
            chrono::Utc::now().timestamp(),
        )?;

        serde_json::from_str(payload).map_err(|e| StripeError::Parse(e.to_string()))
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, StripeError> {
        let url = format!("{}{path}", self.api_base);
        let response = self.client.post(&url).form(form).send().await?;
        Self::parse_response(response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, StripeError> {
        let url = format!("{}{path}", self.api_base);
        let response = self.client.get(&url).query(query).send().await?;
        Self::parse_response(response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<types::ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), "Stripe request succeeded");

        response
            .json()
            .await
            .map_err(|e| StripeError::Parse(e.to_string()))
    }
}
