//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] gamevault_core::EmailError),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Another signup field failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Access token missing, malformed, expired or badly signed.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    TokenSigning(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
