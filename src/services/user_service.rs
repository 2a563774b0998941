//! Domain service for administrative user lifecycle management.
//!
//! Covers create, list, get, suspend, activate, delete (with the cascading
//! resource reassignment), role changes, and password resets. Every mutating
//! operation takes the acting admin's id explicitly and writes exactly one
//! audit entry.

use serde::Serialize;
use thiserror::Error;

use crate::entities::users;

/// Errors surfaced by user lifecycle operations.
///
/// Validation, duplicate, state-conflict, and guard errors are detected
/// before any mutation and are side-effect-free. `Internal` means a storage
/// failure after work was attempted; the enclosing transaction has been
/// rolled back in full.
#[derive(Debug, Error)]
pub enum UserAdminError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User is already suspended")]
    AlreadySuspended,

    #[error("User is already active")]
    AlreadyActive,

    #[error("Operation cannot target the acting admin's own account")]
    SelfModification,

    #[error("Cannot delete the last active admin")]
    LastAdmin,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserAdminError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for UserAdminError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// User role, fixed three-value enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "viewer" => Some(Self::Viewer),
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Account state as a tagged enum. Deleted is terminal. The nullable
/// timestamp pairs in the storage row are derived from this tag at the
/// storage boundary only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended { suspended_at: i64, suspended_by: String },
    Deleted { deleted_at: i64, deleted_by: String },
}

impl UserStatus {
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }
}

/// User data returned from the service (without the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserSnapshot {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub status: UserStatus,
    pub created_at: i64,
    pub last_login: Option<i64>,
    pub force_password_change: bool,
}

impl From<users::Model> for UserSnapshot {
    fn from(model: users::Model) -> Self {
        let status = match (
            model.deleted_at,
            model.deleted_by.clone(),
            model.suspended_at,
            model.suspended_by.clone(),
        ) {
            (Some(deleted_at), Some(deleted_by), _, _) => UserStatus::Deleted {
                deleted_at,
                deleted_by,
            },
            (_, _, Some(suspended_at), Some(suspended_by)) => UserStatus::Suspended {
                suspended_at,
                suspended_by,
            },
            _ => UserStatus::Active,
        };

        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            // Rows predating a role vocabulary change fall back to viewer
            role: Role::parse(&model.role).unwrap_or(Role::Viewer),
            is_active: model.is_active,
            status,
            created_at: model.created_at,
            last_login: model.last_login,
            force_password_change: model.force_password_change,
        }
    }
}

/// User creation parameters.
#[derive(Debug, Clone)]
pub struct CreateUserParams {
    /// Required, unique, case-sensitive, at most 255 chars
    pub username: String,
    /// Required, 8-1000 chars; stored only as its Argon2id hash
    pub password: String,
    /// Optional, must contain `@`, at most 255 chars
    pub email: Option<String>,
    pub role: Role,
}

/// Listing filters and pagination.
#[derive(Debug, Clone, Default)]
pub struct ListUsersFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// Partial match on username or email
    pub search: Option<String>,
    /// 1-based page number; 0 is rejected
    pub page: Option<u64>,
    /// At most 100
    pub page_size: Option<u64>,
}

/// One page of users, newest first, plus the unpaged total.
#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<UserSnapshot>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

/// Identifying details for one agent swept by a delete cascade.
#[derive(Debug, Clone, Serialize)]
pub struct ReassignedAgent {
    pub id: String,
    pub name: String,
    pub previous_owner_id: String,
    pub previous_project_id: String,
}

/// Composite summary of a delete cascade. The per-agent detail list is
/// omitted from responses when no agents were owned.
#[derive(Debug, Serialize)]
pub struct ReassignmentSummary {
    pub agents_reassigned: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reassigned_agents: Vec<ReassignedAgent>,
    pub budget_requests_cancelled: u64,
    pub api_tokens_revoked: u64,
}

/// Result of a committed delete cascade.
#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub user: UserSnapshot,
    pub reassignment: ReassignmentSummary,
}

/// Domain service trait for admin-only user lifecycle operations.
///
/// The `actor` parameter is always the authenticated acting admin's user id;
/// the service never reads ambient identity.
#[async_trait::async_trait]
pub trait UserAdminService: Send + Sync {
    /// Creates a new active user account.
    ///
    /// # Errors
    ///
    /// Returns [`UserAdminError::Validation`] on malformed input and
    /// [`UserAdminError::Duplicate`] on a username collision.
    async fn create_user(
        &self,
        actor: &str,
        params: CreateUserParams,
    ) -> Result<UserSnapshot, UserAdminError>;

    /// Lists users, newest first, with optional filters.
    async fn list_users(&self, filter: ListUsersFilter) -> Result<UserPage, UserAdminError>;

    /// Gets a single user by id.
    async fn get_user(&self, target: &str) -> Result<UserSnapshot, UserAdminError>;

    /// Suspends an active user. Issued tokens and owned agents are left
    /// untouched; only future logins are affected (callers gate on
    /// `is_active`).
    async fn suspend_user(
        &self,
        actor: &str,
        target: &str,
        reason: Option<String>,
    ) -> Result<UserSnapshot, UserAdminError>;

    /// Reactivates a suspended user, clearing the suspension pair.
    async fn activate_user(&self, actor: &str, target: &str)
    -> Result<UserSnapshot, UserAdminError>;

    /// Soft-deletes a user and atomically reassigns everything it owned:
    /// agents move to the orphaned fallback project, pending budget requests
    /// are cancelled, issued user tokens are revoked. One composite audit
    /// entry records the whole cascade.
    ///
    /// # Errors
    ///
    /// [`UserAdminError::SelfModification`] when targeting the actor,
    /// [`UserAdminError::LastAdmin`] when the target is the last active
    /// admin, [`UserAdminError::NotFound`] when absent or already deleted,
    /// [`UserAdminError::Internal`] on a mid-cascade storage failure (the
    /// transaction has been rolled back in full).
    async fn delete_user(&self, actor: &str, target: &str)
    -> Result<DeleteOutcome, UserAdminError>;

    /// Changes a user's role. Outstanding credentials keep carrying the old
    /// role until reissued.
    async fn change_role(
        &self,
        actor: &str,
        target: &str,
        new_role: Role,
    ) -> Result<UserSnapshot, UserAdminError>;

    /// Resets a user's password to a new admin-chosen value, optionally
    /// forcing a change on next login. Outstanding tokens stay valid.
    async fn reset_password(
        &self,
        actor: &str,
        target: &str,
        new_password: &str,
        force_change: bool,
    ) -> Result<UserSnapshot, UserAdminError>;
}
