//! Database migration command.
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded at
//! compile time. The server never runs them on startup.
//!
//! ```text
//! migrations/
//! ├── 20260301000001_create_users.sql
//! ├── 20260301000002_create_products.sql
//! ├── 20260301000003_create_cart_items.sql
//! └── 20260301000004_create_orders.sql
//! ```

use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
