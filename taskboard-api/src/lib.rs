//! # Taskboard API Server Library
//!
//! HTTP surface of the task board: scoped task listing, task commands, the
//! priority board projection and admin user provisioning.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: JWT authentication and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
