//! Authentication and authorization primitives
//!
//! # Modules
//!
//! - [`context`]: the authenticated caller ([`AuthContext`])
//! - [`jwt`]: HS256 access token validation
//! - [`password`]: Argon2id password hashing
//! - [`authorization`]: role and assignee checks

pub mod authorization;
pub mod context;
pub mod jwt;
pub mod password;

pub use context::AuthContext;
