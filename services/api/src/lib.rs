//! snapfeed api service
//!
//! Library surface of the service so integration tests can exercise the
//! repositories and auth core directly; the binary in `main.rs` wires
//! the same pieces to a listening socket.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod response;
pub mod routes;
pub mod session;
pub mod upload;
pub mod validation;

use sqlx::PgPool;

use crate::{
    jwt::JwtService,
    repositories::{PostRepository, UserRepository},
    session::SessionStore,
    upload::ImageHost,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub post_repository: PostRepository,
    pub session_store: SessionStore,
    pub image_host: ImageHost,
}
