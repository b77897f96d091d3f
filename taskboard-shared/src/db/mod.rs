//! Database plumbing
//!
//! - [`pool`]: connection pool creation and health checks
//! - [`migrations`]: embedded schema migrations
//!
//! Queries themselves live in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
