//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity as stored
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub password_hash: String,
    /// Single active refresh token slot; None when logged out
    pub refresh_token: Option<String>,
    pub post_ids: Vec<Uuid>,
    pub liked_post_ids: Vec<Uuid>,
    pub saved_post_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User projection safe to return to clients
///
/// This is the only user shape that is ever serialized into a response.
/// `password_hash` and `refresh_token` have no field here at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub post_ids: Vec<Uuid>,
    pub liked_post_ids: Vec<Uuid>,
    pub saved_post_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for SanitizedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            bio: user.bio,
            image_url: user.image_url,
            post_ids: user.post_ids,
            liked_post_ids: user.liked_post_ids,
            saved_post_ids: user.saved_post_ids,
            created_at: user.created_at,
        }
    }
}

/// New user creation payload
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            name: "Alice".to_string(),
            bio: None,
            image_url: None,
            password_hash: "$argon2id$...".to_string(),
            refresh_token: Some("some.refresh.token".to_string()),
            post_ids: vec![],
            liked_post_ids: vec![],
            saved_post_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sanitized_user_has_no_secrets() {
        let sanitized = SanitizedUser::from(sample_user());
        let value = serde_json::to_value(&sanitized).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();

        assert!(!keys.iter().any(|k| k.as_str() == "passwordHash"));
        assert!(!keys.iter().any(|k| k.as_str() == "password_hash"));
        assert!(!keys.iter().any(|k| k.as_str() == "refreshToken"));
        assert!(!keys.iter().any(|k| k.as_str() == "refresh_token"));
    }

    #[test]
    fn test_sanitized_user_keeps_profile_fields() {
        let user = sample_user();
        let sanitized = SanitizedUser::from(user.clone());

        assert_eq!(sanitized.id, user.id);
        assert_eq!(sanitized.username, "alice");
        assert_eq!(sanitized.email, "alice@x.com");
        assert_eq!(sanitized.name, "Alice");
    }
}
