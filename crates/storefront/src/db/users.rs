//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use gamevault_core::{Email, UserId};

use super::RepositoryError;
use crate::models::user::ProfileChanges;
use crate::models::{ShippingAddress, User};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, address, \
     stripe_customer_id, is_admin, created_at, updated_at";

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    address: Option<Json<ShippingAddress>>,
    stripe_customer_id: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            username: row.username,
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            address: row.address.map(|Json(a)| a),
            stripe_customer_id: row.stripe_customer_id,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row type carrying the password hash alongside the user.
#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a user with a pre-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        username: &str,
        email: &Email,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO store.users (username, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "email already exists"))?;

        row.try_into()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM store.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM store.users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((User::try_from(r.user)?, r.password_hash)))
            .transpose()
    }

    /// Get the password hash for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM store.users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(hash)
    }

    /// List users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64), RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS} FROM store.users
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total = self.count().await?;
        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, total))
    }

    /// Count all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM store.users")
            .fetch_one(self.pool)
            .await?;
        Ok(total)
    }

    /// Apply profile changes. Fields left as `None` are unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE store.users SET
                username = COALESCE($2, username),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                address = COALESCE($5, address),
                is_admin = COALESCE($6, is_admin),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.username.as_deref())
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(changes.address.clone().map(Json))
        .bind(changes.is_admin)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE store.users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store the Stripe customer id for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_stripe_customer_id(
        &self,
        id: UserId,
        customer_id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE store.users SET stripe_customer_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(customer_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Grant or revoke admin rights by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has that email.
    pub async fn set_admin_by_email(
        &self,
        email: &Email,
        is_admin: bool,
    ) -> Result<UserId, RepositoryError> {
        sqlx::query_scalar::<_, UserId>(
            r"
            UPDATE store.users SET is_admin = $2, updated_at = NOW()
            WHERE email = $1
            RETURNING id
            ",
        )
        .bind(email)
        .bind(is_admin)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a user. Their cart rows go with them.
    ///
    /// # Returns
    ///
    /// `true` if a user was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store.users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
