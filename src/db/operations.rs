use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;
use chrono::Utc;
use std::time::Duration;
use std::sync::Arc;

use crate::db::models::User;
use crate::error::{AppError, DatabaseError};

#[derive(Clone)]
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| {
                AppError::DatabaseError(DatabaseError::ConnectionError(e.to_string()))
            })?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Insert a new user record. The unique index on `email` is the
    /// authoritative duplicate guard; a violation surfaces as a
    /// `Duplicate` database error.
    pub async fn create_user(&self, user: &User) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, saved_passwords, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, email, password_hash, saved_passwords, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.saved_passwords)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, saved_passwords, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, saved_passwords, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    /// Append one value to a user's saved passwords. The append happens
    /// in-place in the store, so concurrent appends for the same user
    /// cannot lose entries.
    pub async fn append_saved_password(&self, id: Uuid, value: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET saved_passwords = array_append(saved_passwords, $1), updated_at = $2
            WHERE id = $3
            RETURNING id, username, email, password_hash, saved_passwords, created_at, updated_at
            "#,
        )
        .bind(value)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(user)
    }
}
