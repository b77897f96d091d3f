//! Common test utilities for API integration tests
//!
//! Every test gets its own router over a fresh in-memory store seeded with
//! one admin and two users. Tokens are signed per request.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::Value;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::{ApiConfig, BoardConfig, Config, DatabaseConfig, JwtConfig, ListingConfig};
use taskboard_shared::auth::jwt::{create_token, Claims};
use taskboard_shared::models::{CreateTask, CreateUser, Priority, Role, Status, Task, User};
use taskboard_shared::store::{InMemoryRecordStore, RecordStore};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        listing: ListingConfig::default(),
        board: BoardConfig::default(),
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<InMemoryRecordStore>,
    pub app: axum::Router,
    pub admin: User,
    pub alice: User,
    pub bob: User,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryRecordStore::new());

        let admin = create_user(&store, "Admin", Role::Admin).await;
        let alice = create_user(&store, "Alice", Role::User).await;
        let bob = create_user(&store, "Bob", Role::User).await;

        let app = build_router(AppState::new(store.clone(), config));

        Self {
            store,
            app,
            admin,
            alice,
            bob,
        }
    }

    /// Bearer header value for `user`
    pub fn auth_header(&self, user: &User) -> String {
        let token = create_token(&Claims::new(user.id, user.role), JWT_SECRET)
            .expect("Failed to sign token");
        format!("Bearer {}", token)
    }

    /// Sends a request and returns status plus parsed JSON body
    ///
    /// An empty body parses as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &User) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(self.auth_header(user)), None)
            .await
    }

    /// Inserts a task directly into the store
    pub async fn task(&self, title: &str, priority: Priority, assignee: Uuid) -> Task {
        self.store
            .create_task(CreateTask {
                title: title.to_string(),
                description: String::new(),
                due_date: Utc::now() + Duration::days(7),
                priority,
                status: Status::Pending,
                assigned_to_id: assignee,
            })
            .await
            .expect("Failed to seed task")
    }
}

pub async fn create_user(store: &InMemoryRecordStore, name: &str, role: Role) -> User {
    store
        .create_user(CreateUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role,
            password_hash: "$argon2id$test".to_string(),
        })
        .await
        .expect("Failed to seed user")
}
