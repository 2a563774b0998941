use sea_orm::entity::prelude::*;

/// Append-only. Rows are inserted by the audit repository and never touched
/// again; no update or delete path exists anywhere in the crate.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_audit_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// One of `create`, `suspend`, `activate`, `delete`, `role_change`,
    /// `password_reset`
    pub operation: String,

    pub target_user_id: String,

    pub performed_by: String,

    /// Epoch milliseconds
    pub timestamp: i64,

    /// JSON snapshot before the operation, absent for create
    pub previous_state: Option<String>,

    /// JSON snapshot after the operation
    pub new_state: Option<String>,

    pub reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
