//! Authentication extractors.
//!
//! Callers authenticate with `Authorization: Bearer <token>`. The token is
//! verified on every request; admin rights come from its `admin` claim.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Extractor that requires a valid access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a valid access token with the admin claim.
///
/// Missing or invalid tokens are rejected with `401`, valid non-admin tokens
/// with `403`.
pub struct RequireAdmin(pub CurrentUser);

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request when no valid
/// token is present.
pub struct OptionalAuth(pub Option<CurrentUser>);

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    let token = bearer_token(parts)
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_owned()))?;
    let user = state.tokens().verify(token)?;
    set_sentry_user(&user.id, Some(&user.email));
    Ok(user)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;
        if !user.is_admin {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin route refused");
            return Err(AppError::Forbidden("Admin access required".to_owned()));
        }
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state).ok()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/cart");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts(Some("bearer  abc "))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
