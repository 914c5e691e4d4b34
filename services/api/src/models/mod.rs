//! Data models for the api service

pub mod post;
pub mod user;

pub use post::{NewPost, Post};
pub use user::{NewUser, SanitizedUser, User};
