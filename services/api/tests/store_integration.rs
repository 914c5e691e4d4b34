//! Integration tests for the store-level behavior of the repositories
//!
//! These tests run against the PostgreSQL database configured via
//! `DATABASE_URL`: the atomic like/save toggles on the user row and the
//! unique-constraint handling behind registration.

use api::models::{NewPost, NewUser};
use api::repositories::{self, PostRepository, UserRepository};
use common::database::{DatabaseConfig, init_pool};
use uuid::Uuid;

async fn setup() -> Result<(UserRepository, PostRepository), Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env()?;
    let pool = init_pool(&config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok((UserRepository::new(pool.clone()), PostRepository::new(pool)))
}

// Unique per run so the tests can be re-executed against the same database
fn fresh_user(tag: &str) -> NewUser {
    let suffix = Uuid::new_v4().simple().to_string();
    NewUser {
        username: format!("{}_{}", tag, &suffix[..12]),
        email: format!("{}_{}@example.com", tag, &suffix[..12]),
        name: "Integration Tester".to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$c29tZWhhc2g".to_string(),
    }
}

fn fresh_post(creator_id: Uuid) -> NewPost {
    NewPost {
        creator_id,
        image_url: "https://images.example.com/test.png".to_string(),
        caption: "integration test post".to_string(),
        tags: vec!["test".to_string()],
    }
}

#[tokio::test]
async fn test_toggle_like_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let (users, posts) = setup().await?;
    let user = users.create(&fresh_user("liker")).await?;
    let post = posts.create(&fresh_post(user.id)).await?;
    let likes_before = post.likes;

    // First toggle: membership appears exactly once, counter moves up
    assert!(users.toggle_liked(user.id, post.id).await?);
    let refreshed = users.find_by_id(user.id).await?.unwrap();
    assert_eq!(
        refreshed
            .liked_post_ids
            .iter()
            .filter(|id| **id == post.id)
            .count(),
        1
    );
    assert_eq!(posts.find_by_id(post.id).await?.unwrap().likes, likes_before + 1);

    // Second toggle cancels the first: membership gone, counter restored
    assert!(!users.toggle_liked(user.id, post.id).await?);
    let refreshed = users.find_by_id(user.id).await?.unwrap();
    assert!(!refreshed.liked_post_ids.contains(&post.id));
    assert_eq!(posts.find_by_id(post.id).await?.unwrap().likes, likes_before);

    Ok(())
}

#[tokio::test]
async fn test_toggle_save_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let (users, posts) = setup().await?;
    let user = users.create(&fresh_user("saver")).await?;
    let post = posts.create(&fresh_post(user.id)).await?;

    assert!(users.toggle_saved(user.id, post.id).await?);
    let refreshed = users.find_by_id(user.id).await?.unwrap();
    assert_eq!(
        refreshed
            .saved_post_ids
            .iter()
            .filter(|id| **id == post.id)
            .count(),
        1
    );

    assert!(!users.toggle_saved(user.id, post.id).await?);
    let refreshed = users.find_by_id(user.id).await?.unwrap();
    assert!(!refreshed.saved_post_ids.contains(&post.id));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_registration_is_a_unique_violation()
-> Result<(), Box<dyn std::error::Error>> {
    let (users, _posts) = setup().await?;
    let new_user = fresh_user("dup");
    users.create(&new_user).await?;

    // Same username again: the constraint reports it even though a
    // uniqueness probe would already have passed
    let err = users
        .create(&new_user)
        .await
        .expect_err("duplicate username must fail");
    assert!(repositories::is_unique_violation(&err));

    // Same email under a different username hits the email constraint
    let mut same_email = fresh_user("dup2");
    same_email.email = new_user.email.clone();
    let err = users
        .create(&same_email)
        .await
        .expect_err("duplicate email must fail");
    assert!(repositories::is_unique_violation(&err));

    Ok(())
}
