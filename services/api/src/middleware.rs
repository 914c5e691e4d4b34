//! Authentication middleware
//!
//! Per-request admission: extract a token (named cookie first, then the
//! Authorization header), verify it, resolve the subject user, and attach
//! the authenticated identity to the request before the handler runs. Any
//! failed transition rejects with a single 401 response.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{AppState, error::ApiError, jwt::TokenError, jwt::TokenType};

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authenticated identity attached to admitted requests
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Take the access token from the named cookie, falling back to a
/// `Authorization: Bearer` header
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let jar = CookieJar::from_headers(req.headers());
    let token = extract_token(&jar, req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

    let claims = state.jwt_service.validate_token(&token).map_err(|e| {
        match e {
            TokenError::Expired => warn!("Rejected expired access token"),
            TokenError::Invalid(ref source) => warn!("Rejected invalid access token: {}", source),
        }
        ApiError::Unauthorized("Unauthorized request".to_string())
    })?;

    if claims.token_type != TokenType::Access {
        warn!("Rejected non-access token on guarded route");
        return Err(ApiError::Unauthorized("Unauthorized request".to_string()));
    }

    // Resolve the subject; a token for a deleted account is as good as forged
    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to resolve token subject: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn jar_with_cookie(value: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", ACCESS_TOKEN_COOKIE, value)).unwrap(),
        );
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_extract_token_from_named_cookie() {
        let jar = jar_with_cookie("cookie-token");
        let headers = HeaderMap::new();

        assert_eq!(
            extract_token(&jar, &headers),
            Some("cookie-token".to_string())
        );
    }

    #[test]
    fn test_cookie_takes_precedence_over_header() {
        let jar = jar_with_cookie("cookie-token");
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );

        assert_eq!(
            extract_token(&jar, &headers),
            Some("cookie-token".to_string())
        );
    }

    #[test]
    fn test_extract_token_from_bearer_header() {
        let jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );

        assert_eq!(
            extract_token(&jar, &headers),
            Some("header-token".to_string())
        );
    }

    #[test]
    fn test_non_bearer_header_is_ignored() {
        let jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));

        assert_eq!(extract_token(&jar, &headers), None);
    }

    #[test]
    fn test_missing_token() {
        let jar = CookieJar::new();
        let headers = HeaderMap::new();

        assert_eq!(extract_token(&jar, &headers), None);
    }

    #[test]
    fn test_unrelated_cookie_is_not_a_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark"),
        );
        let jar = CookieJar::from_headers(&headers);

        assert_eq!(extract_token(&jar, &headers), None);
    }
}
