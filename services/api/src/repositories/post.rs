//! Post repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewPost, Post};

const POST_COLUMNS: &str =
    "id, creator_id, image_url, caption, likes, tags, created_at, updated_at";

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        creator_id: row.get("creator_id"),
        image_url: row.get("image_url"),
        caption: row.get("caption"),
        likes: row.get("likes"),
        tags: row.get("tags"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Post repository
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    /// Create a new post repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub async fn create(&self, new_post: &NewPost) -> Result<Post> {
        info!("Creating post for user: {}", new_post.creator_id);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO posts (creator_id, image_url, caption, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING {POST_COLUMNS}
            "#,
        ))
        .bind(new_post.creator_id)
        .bind(&new_post.image_url)
        .bind(&new_post.caption)
        .bind(&new_post.tags)
        .fetch_one(&self.pool)
        .await?;

        Ok(post_from_row(&row))
    }

    /// Get all posts, newest first
    pub async fn get_all(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            ORDER BY created_at DESC
            "#,
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    /// Find a post by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// Resolve a set of post ids to posts. Ids with no surviving row are
    /// silently dropped, so dangling references in like/save sets are
    /// tolerated at read time.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE id = ANY($1)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    /// All posts created by a user, newest first
    pub async fn find_by_creator(&self, creator_id: Uuid) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE creator_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    /// Update a post's caption and/or tags. Scoped to the creator so a
    /// user can only touch their own posts. Returns None when no such
    /// post exists.
    pub async fn update(
        &self,
        post_id: Uuid,
        creator_id: Uuid,
        caption: Option<&str>,
        tags: Option<&[String]>,
    ) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE posts
            SET caption = COALESCE($3, caption),
                tags = COALESCE($4, tags),
                updated_at = now()
            WHERE id = $1 AND creator_id = $2
            RETURNING {POST_COLUMNS}
            "#,
        ))
        .bind(post_id)
        .bind(creator_id)
        .bind(caption)
        .bind(tags)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// Delete a post owned by the given creator. Returns true when a row
    /// was removed.
    pub async fn delete(&self, post_id: Uuid, creator_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1 AND creator_id = $2
            "#,
        )
        .bind(post_id)
        .bind(creator_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
