//! Post model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub image_url: String,
    pub caption: String,
    pub likes: i64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New post creation payload
#[derive(Debug, Clone)]
pub struct NewPost {
    pub creator_id: Uuid,
    pub image_url: String,
    pub caption: String,
    pub tags: Vec<String>,
}
