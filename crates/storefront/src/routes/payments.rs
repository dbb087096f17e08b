//! Stripe payment endpoints.
//!
//! Every endpoint answers `503` when Stripe is not configured.

use axum::{
    Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::RequireAuth;
use crate::services::payments::{PaymentError, PaymentService};
use crate::services::stripe::{IntentResponse, PaymentMethod};
use crate::state::AppState;

/// Header carrying the webhook signature.
const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Build the payments router, mounted at `/api/payments`.
///
/// The webhook is served by [`webhook_router`] so it can sit outside the
/// per-IP rate limit.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/intent", post(create_intent))
        .route("/methods", get(methods))
}

/// Build the webhook router, mounted at `/api`.
pub fn webhook_router() -> Router<AppState> {
    Router::new().route("/payments/webhook", post(webhook))
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
struct WebhookAck {
    received: bool,
}

/// Create a payment intent for the caller's cart.
async fn create_intent(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<IntentResponse>> {
    let intent = PaymentService::new(state.pool(), state.stripe())?
        .create_intent(user.id)
        .await?;
    Ok(Json(intent))
}

/// The caller's saved cards.
async fn methods(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentMethod>>> {
    let methods = PaymentService::new(state.pool(), state.stripe())?
        .payment_methods(user.id)
        .await?;
    Ok(Json(methods))
}

/// Receive a Stripe event.
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>> {
    let stripe = state.stripe().ok_or(PaymentError::Disabled)?;
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".to_owned()))?;

    let event = stripe.construct_event(&body, signature).map_err(|e| {
        tracing::warn!(error = %e, "Rejected webhook");
        PaymentError::from(e)
    })?;

    PaymentService::new(state.pool(), Some(stripe))?
        .handle_event(&event)
        .await?;

    Ok(Json(WebhookAck { received: true }))
}
