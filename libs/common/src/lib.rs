//! Common library for the snapfeed backend
//!
//! This crate provides the infrastructure shared by the service crates:
//! PostgreSQL connectivity and the database error taxonomy.

pub mod database;
pub mod error;
