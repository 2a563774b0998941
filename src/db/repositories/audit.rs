//! Append-only audit trail for user management operations.
//!
//! The repository exposes insert and read paths only; there is no update or
//! delete anywhere in the crate, so immutability is enforced by the
//! interface, not by convention. Writes are generic over `ConnectionTrait`
//! so they join the enclosing business transaction: an un-audited mutation
//! cannot commit.

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::db::now_ms;
use crate::entities::user_audit_log;

/// The fixed operation vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOperation {
    Create,
    Suspend,
    Activate,
    Delete,
    RoleChange,
    PasswordReset,
}

impl AuditOperation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Suspend => "suspend",
            Self::Activate => "activate",
            Self::Delete => "delete",
            Self::RoleChange => "role_change",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// One entry to append. Snapshots are stored redundantly by design so the
/// trail can reconstruct "who did what to whom" after the referenced rows
/// are gone.
pub struct NewAuditEntry<'a> {
    pub operation: AuditOperation,
    pub target_user_id: &'a str,
    pub performed_by: &'a str,
    pub previous_state: Option<serde_json::Value>,
    pub new_state: Option<serde_json::Value>,
    pub reason: Option<&'a str>,
}

/// Appends one entry inside the caller's transaction.
pub async fn append<C: ConnectionTrait>(conn: &C, entry: NewAuditEntry<'_>) -> Result<()> {
    user_audit_log::ActiveModel {
        operation: Set(entry.operation.as_str().to_string()),
        target_user_id: Set(entry.target_user_id.to_string()),
        performed_by: Set(entry.performed_by.to_string()),
        timestamp: Set(now_ms()),
        previous_state: Set(entry.previous_state.map(|v| v.to_string())),
        new_state: Set(entry.new_state.map(|v| v.to_string())),
        reason: Set(entry.reason.map(ToString::to_string)),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(())
}

/// Read access to the trail.
pub struct AuditLogRepository {
    conn: DatabaseConnection,
}

impl AuditLogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_user(&self, target: &str) -> Result<Vec<user_audit_log::Model>> {
        let entries = user_audit_log::Entity::find()
            .filter(user_audit_log::Column::TargetUserId.eq(target))
            .order_by_desc(user_audit_log::Column::Timestamp)
            .all(&self.conn)
            .await?;
        Ok(entries)
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<user_audit_log::Model>> {
        let entries = user_audit_log::Entity::find()
            .order_by_desc(user_audit_log::Column::Timestamp)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(entries)
    }
}
