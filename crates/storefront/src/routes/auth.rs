//! Signup and signin.

use axum::{Router, extract::State, http::StatusCode, routing::post};

use crate::error::{Result, add_breadcrumb};
use crate::extract::Json;
use crate::models::User;
use crate::models::user::{AuthResponse, SigninRequest, SignupRequest};
use crate::services::auth::AuthService;
use crate::services::payments::PaymentService;
use crate::state::AppState;

/// Build the auth router, mounted at `/api/auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}

/// Create an account and return a token for it.
async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let user = AuthService::new(state.pool()).signup(&request).await?;
    let user = attach_stripe_customer(&state, user).await;

    let token = state.tokens().issue(&user)?;
    add_breadcrumb("auth", "Signed up", None);

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Exchange credentials for a token.
async fn signin(
    State(state): State<AppState>,
    Json(request): Json<SigninRequest>,
) -> Result<Json<AuthResponse>> {
    let user = AuthService::new(state.pool())
        .signin(&request.email, &request.password)
        .await?;
    let token = state.tokens().issue(&user)?;

    Ok(Json(AuthResponse { token, user }))
}

/// Create the Stripe customer for a new account when payments are enabled.
///
/// Failures are logged; the customer is created lazily on the first payment
/// intent instead.
async fn attach_stripe_customer(state: &AppState, mut user: User) -> User {
    let Ok(payments) = PaymentService::new(state.pool(), state.stripe()) else {
        return user;
    };
    match payments.ensure_customer(&user).await {
        Ok(customer_id) => user.stripe_customer_id = Some(customer_id),
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Stripe customer creation failed");
        }
    }
    user
}
