//! User repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, username, email, name, bio, image_url, password_hash, \
     refresh_token, post_ids, liked_post_ids, saved_post_ids, created_at, updated_at";

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        name: row.get("name"),
        bio: row.get("bio"),
        image_url: row.get("image_url"),
        password_hash: row.get("password_hash"),
        refresh_token: row.get("refresh_token"),
        post_ids: row.get("post_ids"),
        liked_post_ids: row.get("liked_post_ids"),
        saved_post_ids: row.get("saved_post_ids"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.username);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1
            "#,
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Find a user holding either the given username or the given email,
    /// used as the uniqueness probe during registration
    pub async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1 OR email = $2
            "#,
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Get all users
    pub async fn get_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY created_at DESC
            "#,
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    /// Users ranked by number of created posts
    pub async fn top_creators(&self, limit: i64) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY cardinality(post_ids) DESC, created_at ASC
            LIMIT $1
            "#,
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    /// Toggle a post id in the user's liked set and adjust the post's
    /// like counter. Both rows change in one transaction, so a failed
    /// counter update rolls the membership flip back rather than leaving
    /// the two tables off by one. Returns true when the post is liked
    /// after the call.
    pub async fn toggle_liked(&self, user_id: Uuid, post_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE users
            SET liked_post_ids = CASE
                    WHEN $2 = ANY(liked_post_ids) THEN array_remove(liked_post_ids, $2)
                    ELSE array_append(liked_post_ids, $2)
                END,
                updated_at = now()
            WHERE id = $1
            RETURNING ($2 = ANY(liked_post_ids)) AS member
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {} not found", user_id))?;
        let member: bool = row.get("member");

        let delta: i64 = if member { 1 } else { -1 };
        sqlx::query(
            r#"
            UPDATE posts
            SET likes = GREATEST(likes + $2, 0),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(member)
    }

    /// Toggle a post id in the user's saved set. Returns true when the
    /// post is saved after the call.
    pub async fn toggle_saved(&self, user_id: Uuid, post_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET saved_post_ids = CASE
                    WHEN $2 = ANY(saved_post_ids) THEN array_remove(saved_post_ids, $2)
                    ELSE array_append(saved_post_ids, $2)
                END,
                updated_at = now()
            WHERE id = $1
            RETURNING ($2 = ANY(saved_post_ids)) AS member
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {} not found", user_id))?;

        Ok(row.get("member"))
    }

    /// Record a newly created post on the creator's profile
    pub async fn add_post(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET post_ids = array_append(array_remove(post_ids, $2), $2),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a deleted post from the creator's profile
    pub async fn remove_post(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET post_ids = array_remove(post_ids, $2),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
