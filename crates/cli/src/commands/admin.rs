//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin account
//! gv-cli admin create -e admin@example.com -u admin -p 'a long passphrase'
//!
//! # Promote or demote an existing account
//! gv-cli admin promote -e player@example.com
//! gv-cli admin demote -e player@example.com
//! ```
//!
//! Admin rights are carried in access tokens, so a change takes effect the
//! next time the account signs in.

use gamevault_core::{Email, UserId};
use gamevault_storefront::db::{RepositoryError, UserRepository};
use gamevault_storefront::models::user::validate_username;
use gamevault_storefront::services::auth::{hash_password, validate_password};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Invalid username or password.
    #[error("{0}")]
    Invalid(String),

    /// Account already exists.
    #[error("An account already exists with email: {0}")]
    UserExists(String),

    /// No account with that email.
    #[error("No account with email: {0}")]
    UserNotFound(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created account.
///
/// # Errors
///
/// Returns an error for invalid input, a taken email or a database failure.
pub async fn create_user(
    email: &str,
    username: &str,
    password: &str,
) -> Result<UserId, AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let username = validate_username(username).map_err(|e| AdminError::Invalid(e.to_string()))?;
    validate_password(password).map_err(|e| AdminError::Invalid(e.to_string()))?;
    let password_hash = hash_password(password).map_err(|e| AdminError::Invalid(e.to_string()))?;

    let pool = connect().await?;
    tracing::info!("Creating admin account: {} ({})", username, email);

    let user = UserRepository::new(&pool)
        .create(&username, &email, &password_hash, true)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

/// Grant or revoke admin rights on an existing account.
///
/// # Errors
///
/// Returns an error for an unknown email or a database failure.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let pool = connect().await?;
    let id = UserRepository::new(&pool)
        .set_admin_by_email(&email, is_admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    if is_admin {
        tracing::info!("Account {} ({}) is now an admin", id, email);
    } else {
        tracing::info!("Account {} ({}) is no longer an admin", id, email);
    }
    Ok(())
}
