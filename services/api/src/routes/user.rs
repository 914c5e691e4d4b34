//! User routes: the register/login/logout handshake, token refresh, and
//! the profile/like/save/feed handlers behind the auth gate

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    jwt::TokenType,
    middleware::{ACCESS_TOKEN_COOKIE, AuthUser, REFRESH_TOKEN_COOKIE, auth_middleware},
    models::{NewUser, SanitizedUser},
    password,
    repositories,
    response::ApiResponse,
    validation,
};

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request for token refresh; the token may also come from the cookie
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Response body for login
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: SanitizedUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Response body for token refresh
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: String,
}

/// Request toggling like/save membership for a post
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TogglePostRequest {
    pub post_id: Uuid,
}

/// Create the user router
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/current-user", get(current_user))
        .route("/like-post", patch(toggle_like))
        .route("/save-post", patch(toggle_save))
        .route("/get-liked-post", get(liked_posts))
        .route("/get-saved-posts", get(saved_posts))
        .route("/top-creator", get(top_creators))
        .route("/get-user/:user_id", get(user_by_id))
        .route("/get-user-posts/:user_id", get(user_posts))
        .route("/get-all-users", get(all_users))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .merge(protected)
        .with_state(state)
}

fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_username(&payload.username).map_err(ApiError::Validation)?;
    validation::validate_email(&payload.email).map_err(ApiError::Validation)?;
    validation::validate_name(&payload.name).map_err(ApiError::Validation)?;
    validation::validate_password(&payload.password).map_err(ApiError::Validation)?;

    let existing = state
        .user_repository
        .find_by_username_or_email(&payload.username, &payload.email)
        .await
        .map_err(|e| {
            error!("Failed to check user uniqueness: {}", e);
            ApiError::InternalServerError
        })?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = password::hash_password(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::InternalServerError
    })?;

    let user = state
        .user_repository
        .create(&NewUser {
            username: payload.username,
            email: payload.email,
            name: payload.name.trim().to_string(),
            password_hash,
        })
        .await
        .map_err(|e| {
            // A concurrent registration can slip past the probe above;
            // the unique constraint reports it as a conflict, not a 500
            if repositories::is_unique_violation(&e) {
                return ApiError::Conflict("User already exists".to_string());
            }
            error!("Failed to create user: {}", e);
            ApiError::InternalServerError
        })?;

    info!("Registered user: {}", user.username);

    Ok(ApiResponse::new(
        200,
        SanitizedUser::from(user),
        "user registered successfully",
    ))
}

/// Authenticate and open a session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_username(&payload.username).map_err(ApiError::Validation)?;
    validation::validate_password(&payload.password).map_err(ApiError::Validation)?;

    let user = state
        .user_repository
        .find_by_username(&payload.username)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::Unauthorized("invalid user credentials".to_string()))?;

    let password_matches =
        password::verify_password(&payload.password, &user.password_hash).map_err(|e| {
            error!("Failed to verify password: {}", e);
            ApiError::InternalServerError
        })?;
    if !password_matches {
        warn!("Failed login attempt for user: {}", user.username);
        return Err(ApiError::Unauthorized(
            "invalid user credentials".to_string(),
        ));
    }

    let access_token = state.jwt_service.generate_access_token(user.id).map_err(|e| {
        error!("Failed to generate access token: {}", e);
        ApiError::InternalServerError
    })?;
    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user.id)
        .map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            ApiError::InternalServerError
        })?;

    state
        .session_store
        .set_refresh_token(user.id, &refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to persist refresh token: {}", e);
            ApiError::InternalServerError
        })?;

    info!("User logged in: {}", user.username);

    let jar = jar
        .add(auth_cookie(ACCESS_TOKEN_COOKIE, access_token.clone()))
        .add(auth_cookie(REFRESH_TOKEN_COOKIE, refresh_token.clone()));

    Ok((
        jar,
        ApiResponse::new(
            200,
            LoginData {
                user: SanitizedUser::from(user),
                access_token,
                refresh_token,
            },
            "user logged in successfully",
        ),
    ))
}

/// Exchange a valid refresh token for a new token pair
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| payload.and_then(|Json(body)| body.refresh_token))
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

    let claims = state.jwt_service.validate_token(&presented).map_err(|e| {
        warn!("Rejected refresh token: {}", e);
        ApiError::Unauthorized("Unauthorized request".to_string())
    })?;
    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized("Unauthorized request".to_string()));
    }

    // The presented token must be the one in the slot; logout and
    // re-login both invalidate anything issued earlier
    let stored = state
        .session_store
        .get_refresh_token(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to read refresh token slot: {}", e);
            ApiError::InternalServerError
        })?;
    if stored.as_deref() != Some(presented.as_str()) {
        warn!("Rejected refresh token not matching the stored slot");
        return Err(ApiError::Unauthorized("Unauthorized request".to_string()));
    }

    let access_token = state
        .jwt_service
        .generate_access_token(claims.sub)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            ApiError::InternalServerError
        })?;
    let new_refresh_token = state
        .jwt_service
        .generate_refresh_token(claims.sub)
        .map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            ApiError::InternalServerError
        })?;

    state
        .session_store
        .set_refresh_token(claims.sub, &new_refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to persist refresh token: {}", e);
            ApiError::InternalServerError
        })?;

    let jar = jar
        .add(auth_cookie(ACCESS_TOKEN_COOKIE, access_token.clone()))
        .add(auth_cookie(REFRESH_TOKEN_COOKIE, new_refresh_token.clone()));

    Ok((
        jar,
        ApiResponse::new(
            200,
            TokenData {
                access_token,
                refresh_token: new_refresh_token,
            },
            "token refreshed successfully",
        ),
    ))
}

/// Close the caller's session
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    state
        .session_store
        .clear_refresh_token(auth_user.id)
        .await
        .map_err(|e| {
            error!("Failed to clear refresh token: {}", e);
            ApiError::InternalServerError
        })?;

    info!("User logged out: {}", auth_user.username);

    let jar = jar
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
        .remove(removal_cookie(REFRESH_TOKEN_COOKIE));

    Ok((
        jar,
        ApiResponse::new(
            200,
            serde_json::json!({}),
            "user logged out successfully",
        ),
    ))
}

/// Fetch the caller's own profile
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(auth_user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch current user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::new(
        200,
        SanitizedUser::from(user),
        "current user fetched successfully",
    ))
}

/// Toggle the caller's like on a post
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<TogglePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .post_repository
        .find_by_id(payload.post_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch post: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    // Membership flip and like counter move together in one transaction
    let liked = state
        .user_repository
        .toggle_liked(auth_user.id, payload.post_id)
        .await
        .map_err(|e| {
            error!("Failed to toggle like: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::new(
        200,
        serde_json::json!({ "postId": payload.post_id, "liked": liked }),
        if liked { "post liked" } else { "post unliked" },
    ))
}

/// Toggle the caller's save on a post
pub async fn toggle_save(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<TogglePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .post_repository
        .find_by_id(payload.post_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch post: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    let saved = state
        .user_repository
        .toggle_saved(auth_user.id, payload.post_id)
        .await
        .map_err(|e| {
            error!("Failed to toggle save: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::new(
        200,
        serde_json::json!({ "postId": payload.post_id, "saved": saved }),
        if saved { "post saved" } else { "post unsaved" },
    ))
}

/// Posts the caller has liked, dangling ids filtered out
pub async fn liked_posts(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(auth_user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let posts = state
        .post_repository
        .find_by_ids(&user.liked_post_ids)
        .await
        .map_err(|e| {
            error!("Failed to fetch liked posts: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::new(200, posts, "accessed liked posts successfully"))
}

/// Posts the caller has saved, dangling ids filtered out
pub async fn saved_posts(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(auth_user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let posts = state
        .post_repository
        .find_by_ids(&user.saved_post_ids)
        .await
        .map_err(|e| {
            error!("Failed to fetch saved posts: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::new(200, posts, "accessed saved posts successfully"))
}

/// Users ranked by post count
pub async fn top_creators(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let creators = state.user_repository.top_creators(10).await.map_err(|e| {
        error!("Failed to fetch top creators: {}", e);
        ApiError::InternalServerError
    })?;

    let creators: Vec<SanitizedUser> = creators.into_iter().map(SanitizedUser::from).collect();

    Ok(ApiResponse::new(
        200,
        creators,
        "accessed top creators successfully",
    ))
}

/// Fetch a user's profile by id
pub async fn user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::new(
        200,
        SanitizedUser::from(user),
        "user found successfully",
    ))
}

/// Fetch the posts created by a user
pub async fn user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state
        .post_repository
        .find_by_creator(user_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch user posts: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(ApiResponse::new(200, posts, "accessed user posts successfully"))
}

/// Fetch all users
pub async fn all_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.user_repository.get_all().await.map_err(|e| {
        error!("Failed to fetch users: {}", e);
        ApiError::InternalServerError
    })?;

    let users: Vec<SanitizedUser> = users.into_iter().map(SanitizedUser::from).collect();

    Ok(ApiResponse::new(200, users, "accessed users successfully"))
}
