//! Database operations for the store `PostgreSQL` database.
//!
//! # Schema: `store`
//!
//! - `users` - Accounts (credentials, profile, Stripe customer id, admin flag)
//! - `products` - Game catalog with stock levels and media URLs
//! - `cart_items` - One row per (user, product) in a user's cart
//! - `orders` - Order snapshots; line items are a JSONB document
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p gamevault-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` row types.

pub mod carts;
pub mod orders;
pub mod products;
pub mod stats;
pub mod users;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use stats::StatsRepository;
pub use users::UserRepository;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A foreign key pointed at a row that no longer exists. Carries the
    /// constraint name.
    #[error("missing reference: {0}")]
    MissingReference(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn from_unique_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }

    /// Map a foreign-key violation to [`RepositoryError::MissingReference`].
    pub(crate) fn from_foreign_key_violation(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_foreign_key_violation()
        {
            return Self::MissingReference(db_err.constraint().unwrap_or_default().to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Number of pages needed for `total` rows at `limit` per page.
#[must_use]
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 || total <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
