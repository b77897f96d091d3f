//! Shared fixtures for the in-memory integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use taskboard_shared::auth::AuthContext;
use taskboard_shared::models::{CreateTask, CreateUser, Priority, Role, Status, Task, User};
use taskboard_shared::store::{InMemoryRecordStore, RecordStore};
use uuid::Uuid;

pub struct Seeded {
    pub store: Arc<InMemoryRecordStore>,
    pub admin: User,
    pub alice: User,
    pub bob: User,
}

impl Seeded {
    pub fn admin_ctx(&self) -> AuthContext {
        AuthContext::new(self.admin.id, Role::Admin)
    }

    pub fn alice_ctx(&self) -> AuthContext {
        AuthContext::new(self.alice.id, Role::User)
    }

    pub fn bob_ctx(&self) -> AuthContext {
        AuthContext::new(self.bob.id, Role::User)
    }

    pub fn dyn_store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }
}

pub async fn user(store: &InMemoryRecordStore, name: &str, role: Role) -> User {
    store
        .create_user(CreateUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role,
            password_hash: "$argon2id$test".to_string(),
        })
        .await
        .expect("seed user")
}

pub async fn task(
    store: &InMemoryRecordStore,
    title: &str,
    description: &str,
    priority: Priority,
    assignee: Uuid,
) -> Task {
    store
        .create_task(CreateTask {
            title: title.to_string(),
            description: description.to_string(),
            due_date: Utc::now() + Duration::days(7),
            priority,
            status: Status::Pending,
            assigned_to_id: assignee,
        })
        .await
        .expect("seed task")
}

/// One admin and two users, no tasks
pub async fn seeded() -> Seeded {
    let store = Arc::new(InMemoryRecordStore::new());
    let admin = user(&store, "Admin", Role::Admin).await;
    let alice = user(&store, "Alice", Role::User).await;
    let bob = user(&store, "Bob", Role::User).await;

    Seeded {
        store,
        admin,
        alice,
        bob,
    }
}
