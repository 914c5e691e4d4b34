//! Repositories for database operations

pub mod post;
pub mod user;

pub use post::PostRepository;
pub use user::UserRepository;

/// True when the error is a Postgres unique-constraint violation.
/// Concurrent writers can race past an application-level uniqueness
/// probe; the constraint is the arbiter, and callers map this case to
/// a conflict instead of an internal error.
pub fn is_unique_violation(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
