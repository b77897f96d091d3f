/// Middleware modules for the API server
///
/// - `auth`: Bearer JWT validation for `/api` routes
/// - `security`: Security response headers
pub mod auth;
pub mod security;
