//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error body is JSON: `{"message": "..."}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;
use crate::services::payments::PaymentError;
use crate::services::stripe::StripeError;

/// Application-level error type for the store.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order placement failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Client payload failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

const INTERNAL_MESSAGE: &str = "Internal server error";
const GATEWAY_MESSAGE: &str = "Payment provider error";
const PAYMENTS_DISABLED_MESSAGE: &str = "Payments are not configured";

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound | RepositoryError::MissingReference(_) => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) | AuthError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        AuthError::Repository(e) => repository_status(e),
        AuthError::TokenSigning(_) | AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn cart_status(err: &CartError) -> StatusCode {
    match err {
        CartError::UserNotFound => StatusCode::UNAUTHORIZED,
        CartError::ProductNotFound(_) | CartError::NotInCart(_) => StatusCode::NOT_FOUND,
        CartError::Validation(_) => StatusCode::BAD_REQUEST,
        CartError::Repository(e) => repository_status(e),
    }
}

fn stripe_status(err: &StripeError) -> StatusCode {
    match err {
        StripeError::InvalidSignature(_) => StatusCode::BAD_REQUEST,
        StripeError::WebhookNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        StripeError::Http(_) | StripeError::Api { .. } | StripeError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn payment_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
        PaymentError::EmptyCart | PaymentError::Rejected(_) => StatusCode::BAD_REQUEST,
        PaymentError::UserNotFound => StatusCode::NOT_FOUND,
        PaymentError::Stripe(e) => stripe_status(e),
        PaymentError::Cart(e) => cart_status(e),
        PaymentError::Repository(e) => repository_status(e),
    }
}

fn checkout_status(err: &CheckoutError) -> StatusCode {
    match err {
        CheckoutError::EmptyCart | CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
        CheckoutError::Conflict(_) => StatusCode::CONFLICT,
        CheckoutError::UserNotFound => StatusCode::NOT_FOUND,
        CheckoutError::Payment(e) => payment_status(e),
        CheckoutError::Cart(e) => cart_status(e),
        CheckoutError::Repository(e) => repository_status(e),
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(e) => repository_status(e),
            Self::Auth(e) => auth_status(e),
            Self::Cart(e) => cart_status(e),
            Self::Checkout(e) => checkout_status(e),
            Self::Payment(e) => payment_status(e),
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        // Don't expose internal error details to clients
        match self.status() {
            StatusCode::INTERNAL_SERVER_ERROR => return INTERNAL_MESSAGE.to_owned(),
            StatusCode::BAD_GATEWAY => return GATEWAY_MESSAGE.to_owned(),
            StatusCode::SERVICE_UNAVAILABLE => return PAYMENTS_DISABLED_MESSAGE.to_owned(),
            _ => {}
        }

        match self {
            Self::Database(RepositoryError::NotFound | RepositoryError::MissingReference(_)) => {
                "Not found".to_owned()
            }
            Self::Database(RepositoryError::Conflict(msg))
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_owned(),
                AuthError::InvalidToken(_) => "Invalid or expired token".to_owned(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_owned()
                }
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                AuthError::WeakPassword(msg) => msg.clone(),
                other => other.to_string(),
            },
            Self::Payment(PaymentError::Stripe(StripeError::InvalidSignature(_))) => {
                "Invalid webhook signature".to_owned()
            }
            Self::Cart(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Payment(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::RateLimited => "Too many requests, please slow down".to_owned(),
            Self::Database(_) | Self::Internal(_) => INTERNAL_MESSAGE.to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gamevault_core::ProductId;
    use http_body_util::BodyExt;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_nested_error_status_codes() {
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(CartError::ProductNotFound(ProductId::new(1)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::UserNotFound.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(CheckoutError::Conflict("not enough stock".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(PaymentError::Disabled.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(CheckoutError::Payment(PaymentError::Disabled).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(PaymentError::Stripe(StripeError::Parse("bad".into())).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret row".into()));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Internal("connection string leaked".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_body_is_json_message() {
        let response = AppError::Validation(ValidationError("title is required".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["message"], "title is required");
    }
}
