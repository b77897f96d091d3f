//! # Taskboard Shared Library
//!
//! Domain types and services behind the Taskboard API.
//!
//! ## Module Organization
//!
//! - `models`: tasks, users and their enums
//! - `store`: the record store port plus Postgres and in-memory adapters
//! - `query`: filtered, scoped, paginated task listings
//! - `commands`: task and user writes with view invalidation
//! - `views`: cached read views and invalidation broadcast
//! - `dashboard`: cached, failure-tolerant dashboard reads
//! - `board`: priority lanes, shared paging and drag reconciliation
//! - `auth`: caller identity, JWT validation, password hashing, permission checks
//! - `db`: connection pool and migrations

pub mod auth;
pub mod board;
pub mod commands;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod query;
pub mod store;
pub mod views;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
