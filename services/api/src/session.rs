//! Session store: the single refresh-token slot on the user record
//!
//! One active refresh token per account. A new login overwrites the slot
//! (last write wins between concurrent logins), logout clears it. Each
//! operation is one statement keyed by user id, so the store is the sole
//! arbiter of consistency.

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

/// Session store over the users table
#[derive(Clone)]
pub struct SessionStore {
    pool: PgPool,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Overwrite the refresh token slot for a user
    pub async fn set_refresh_token(&self, user_id: Uuid, refresh_token: &str) -> Result<()> {
        info!("Storing refresh token for user: {}", user_id);

        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(refresh_token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Clear the refresh token slot, used on logout
    pub async fn clear_refresh_token(&self, user_id: Uuid) -> Result<()> {
        info!("Clearing refresh token for user: {}", user_id);

        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read the currently stored refresh token, if any
    pub async fn get_refresh_token(&self, user_id: Uuid) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT refresh_token
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|row| row.get("refresh_token")))
    }
}
