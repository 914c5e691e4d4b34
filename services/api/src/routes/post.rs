//! Post routes: creation with image upload, feed reads, update and delete

use axum::{
    Extension, Json, Router,
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::{AuthUser, auth_middleware},
    models::NewPost,
    response::ApiResponse,
};

/// Request updating a post's caption and/or tags
#[derive(Deserialize)]
pub struct UpdatePostRequest {
    pub caption: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Create the post router; every post route sits behind the auth gate
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/create-post", post(create_post))
        .route("/all-post", get(all_posts))
        .route("/get-post/:id", get(get_post))
        .route("/update-post/:id", patch(update_post))
        .route("/delete-post/:id", delete(delete_post))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

/// Create a post from a multipart form carrying the image file, a caption
/// and an optional comma-separated tag list
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut caption: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::Validation(format!("Malformed multipart body: {}", e))
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("caption") => {
                let text = field.text().await.map_err(|e| {
                    ApiError::Validation(format!("Malformed caption field: {}", e))
                })?;
                caption = Some(text);
            }
            Some("tags") => {
                let raw = field.text().await.map_err(|e| {
                    ApiError::Validation(format!("Malformed tags field: {}", e))
                })?;
                tags = raw
                    .split(',')
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect();
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Malformed file field: {}", e)))?
                    .to_vec();
                file = Some((file_name, content_type, bytes));
            }
            _ => {}
        }
    }

    let caption = caption
        .filter(|caption| !caption.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Caption is required".to_string()))?;
    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::Validation("Image file is required".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::Validation("Image file is empty".to_string()));
    }

    let image_url = state
        .image_host
        .upload(&file_name, &content_type, bytes)
        .await
        .map_err(|e| {
            error!("Image upload failed: {}", e);
            ApiError::InternalServerError
        })?;

    let post = state
        .post_repository
        .create(&NewPost {
            creator_id: auth_user.id,
            image_url,
            caption,
            tags,
        })
        .await
        .map_err(|e| {
            error!("Failed to create post: {}", e);
            ApiError::InternalServerError
        })?;

    state
        .user_repository
        .add_post(auth_user.id, post.id)
        .await
        .map_err(|e| {
            error!("Failed to record post on creator profile: {}", e);
            ApiError::InternalServerError
        })?;

    info!("Post {} created by {}", post.id, auth_user.username);

    Ok(ApiResponse::new(200, post, "post created"))
}

/// Fetch all posts
pub async fn all_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.post_repository.get_all().await.map_err(|e| {
        error!("Failed to fetch posts: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(ApiResponse::new(200, posts, "accessed posts successfully"))
}

/// Fetch a single post by id
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .post_repository
        .find_by_id(id)
        .await
        .map_err(|e| {
            error!("Failed to fetch post: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(ApiResponse::new(200, post, "post successfully found"))
}

/// Update the caller's own post
pub async fn update_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.caption.is_none() && payload.tags.is_none() {
        return Err(ApiError::Validation("Nothing to update".to_string()));
    }
    if let Some(caption) = &payload.caption {
        if caption.trim().is_empty() {
            return Err(ApiError::Validation("Caption cannot be empty".to_string()));
        }
    }

    let post = state
        .post_repository
        .update(
            id,
            auth_user.id,
            payload.caption.as_deref(),
            payload.tags.as_deref(),
        )
        .await
        .map_err(|e| {
            error!("Failed to update post: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(ApiResponse::new(200, post, "successfully updated the post"))
}

/// Delete the caller's own post
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .post_repository
        .delete(id, auth_user.id)
        .await
        .map_err(|e| {
            error!("Failed to delete post: {}", e);
            ApiError::InternalServerError
        })?;
    if !deleted {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    // Other users' like/save sets may keep the id; reads tolerate that
    state
        .user_repository
        .remove_post(auth_user.id, id)
        .await
        .map_err(|e| {
            error!("Failed to remove post from creator profile: {}", e);
            ApiError::InternalServerError
        })?;

    info!("Post {} deleted by {}", id, auth_user.username);

    Ok(ApiResponse::new(
        200,
        serde_json::json!({ "postId": id }),
        "successfully deleted post",
    ))
}
