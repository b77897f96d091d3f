//! Permission checks
//!
//! Two rules cover the whole application:
//!
//! 1. **Administrators** see and manage every task and every user.
//! 2. **Users** see and mutate only tasks assigned to themselves, and may
//!    only create tasks assigned to themselves.
//!
//! The query service applies rule 2 to listings on its own (see
//! [`crate::query::TaskQueryService::scope_filter`]); the helpers here guard
//! single-record mutations.
//!
//! # Example
//!
//! ```
//! use taskboard_shared::auth::authorization::{require_admin, require_assignment};
//! use taskboard_shared::auth::AuthContext;
//! use taskboard_shared::models::Role;
//! use uuid::Uuid;
//!
//! let me = AuthContext::new(Uuid::new_v4(), Role::User);
//! assert!(require_admin(&me).is_err());
//! assert!(require_assignment(&me, me.user_id).is_ok());
//! assert!(require_assignment(&me, Uuid::new_v4()).is_err());
//! ```

use uuid::Uuid;

use super::context::AuthContext;
use crate::models::Task;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Operation needs the ADMIN role
    #[error("Administrator access required")]
    AdminRequired,

    /// Caller is neither admin nor the task's assignee
    #[error("Not authorized to access this task")]
    NotAssignee,
}

/// Requires the caller to be an administrator
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

/// Requires the caller to be allowed to act on an existing task
pub fn require_task_access(auth: &AuthContext, task: &Task) -> Result<(), AuthzError> {
    require_assignment(auth, task.assigned_to_id)
}

/// Requires the caller to be allowed to assign work to `assignee`
///
/// Admins may assign to anyone; users only to themselves.
pub fn require_assignment(auth: &AuthContext, assignee: Uuid) -> Result<(), AuthzError> {
    if auth.is_admin() || auth.user_id == assignee {
        Ok(())
    } else {
        Err(AuthzError::NotAssignee)
    }
}
