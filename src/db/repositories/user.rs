use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::config::SecurityConfig;
use crate::constants::limits;
use crate::db::now_ms;
use crate::db::repositories::audit::{self, AuditOperation, NewAuditEntry};
use crate::entities::users;
use crate::services::user_service::{ListUsersFilter, UserAdminError};

/// Row-level operations on the users table. Every mutating method runs the
/// row update and its audit entry in one transaction, and re-checks the
/// target's state inside that transaction so concurrent operations against
/// the same user serialize cleanly.
pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<users::Model>> {
        let user = users::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(user)
    }

    /// Lists users newest first with optional role/active/search filters.
    /// Returns the page plus the unpaged total count.
    pub async fn list(
        &self,
        filter: &ListUsersFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<users::Model>, u64)> {
        let mut condition = Condition::all();

        if let Some(role) = filter.role {
            condition = condition.add(users::Column::Role.eq(role.as_str()));
        }
        if let Some(is_active) = filter.is_active {
            condition = condition.add(users::Column::IsActive.eq(is_active));
        }
        if let Some(ref search) = filter.search {
            condition = condition.add(
                Condition::any()
                    .add(users::Column::Username.contains(search))
                    .add(users::Column::Email.contains(search)),
            );
        }

        let paginator = users::Entity::find()
            .filter(condition)
            .order_by_desc(users::Column::CreatedAt)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        // Pages are 1-based at the API boundary, 0-based in sea-orm
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    /// Inserts a new active user and its audit entry in one transaction.
    /// The caller has already validated the input and hashed the password.
    pub async fn create(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
        role: &str,
        actor: &str,
    ) -> Result<users::Model, UserAdminError> {
        let now = now_ms();
        let id = format!("user_{}", uuid::Uuid::new_v4());

        let txn = self.conn.begin().await?;

        let model = users::ActiveModel {
            id: Set(id.clone()),
            username: Set(username.to_string()),
            email: Set(email.map(ToString::to_string)),
            password_hash: Set(password_hash.to_string()),
            role: Set(role.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            last_login: Set(None),
            suspended_at: Set(None),
            suspended_by: Set(None),
            deleted_at: Set(None),
            deleted_by: Set(None),
            force_password_change: Set(false),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE") {
                UserAdminError::Duplicate(format!("username '{username}' already exists"))
            } else {
                UserAdminError::from(e)
            }
        })?;

        audit::append(
            &txn,
            NewAuditEntry {
                operation: AuditOperation::Create,
                target_user_id: &id,
                performed_by: actor,
                previous_state: None,
                new_state: Some(serde_json::json!({
                    "username": username,
                    "email": email,
                    "role": role,
                    "is_active": true,
                })),
                reason: None,
            },
        )
        .await?;

        txn.commit().await?;
        Ok(model)
    }

    /// Suspends an active user, recording who did it and why.
    pub async fn suspend(
        &self,
        target: &str,
        actor: &str,
        reason: Option<String>,
    ) -> Result<users::Model, UserAdminError> {
        let txn = self.conn.begin().await?;
        let user = load_live_user(&txn, target).await?;

        if !user.is_active {
            return Err(UserAdminError::AlreadySuspended);
        }

        let now = now_ms();
        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(false);
        active.suspended_at = Set(Some(now));
        active.suspended_by = Set(Some(actor.to_string()));
        let updated = active.update(&txn).await?;

        audit::append(
            &txn,
            NewAuditEntry {
                operation: AuditOperation::Suspend,
                target_user_id: target,
                performed_by: actor,
                previous_state: Some(serde_json::json!({ "is_active": true })),
                new_state: Some(serde_json::json!({
                    "is_active": false,
                    "suspended_at": now,
                    "suspended_by": actor,
                })),
                reason: reason.as_deref(),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Reactivates a suspended user and clears the suspension pair.
    pub async fn activate(
        &self,
        target: &str,
        actor: &str,
    ) -> Result<users::Model, UserAdminError> {
        let txn = self.conn.begin().await?;
        let user = load_live_user(&txn, target).await?;

        if user.is_active {
            return Err(UserAdminError::AlreadyActive);
        }

        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(true);
        active.suspended_at = Set(None);
        active.suspended_by = Set(None);
        let updated = active.update(&txn).await?;

        audit::append(
            &txn,
            NewAuditEntry {
                operation: AuditOperation::Activate,
                target_user_id: target,
                performed_by: actor,
                previous_state: Some(serde_json::json!({ "is_active": false })),
                new_state: Some(serde_json::json!({ "is_active": true })),
                reason: None,
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Changes the user's role, auditing the before/after pair.
    pub async fn change_role(
        &self,
        target: &str,
        actor: &str,
        new_role: &str,
    ) -> Result<users::Model, UserAdminError> {
        let txn = self.conn.begin().await?;
        let user = load_live_user(&txn, target).await?;
        let old_role = user.role.clone();

        let mut active: users::ActiveModel = user.into();
        active.role = Set(new_role.to_string());
        let updated = active.update(&txn).await?;

        audit::append(
            &txn,
            NewAuditEntry {
                operation: AuditOperation::RoleChange,
                target_user_id: target,
                performed_by: actor,
                previous_state: Some(serde_json::json!({ "role": old_role })),
                new_state: Some(serde_json::json!({ "role": new_role })),
                reason: None,
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Stores a new password hash, optionally forcing a change on next
    /// login. Issued tokens are not touched.
    pub async fn reset_password(
        &self,
        target: &str,
        actor: &str,
        password_hash: &str,
        force_change: bool,
    ) -> Result<users::Model, UserAdminError> {
        let txn = self.conn.begin().await?;
        let user = load_live_user(&txn, target).await?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash.to_string());
        active.force_password_change = Set(force_change);
        let updated = active.update(&txn).await?;

        audit::append(
            &txn,
            NewAuditEntry {
                operation: AuditOperation::PasswordReset,
                target_user_id: target,
                performed_by: actor,
                previous_state: None,
                new_state: Some(serde_json::json!({ "force_password_change": force_change })),
                reason: None,
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }
}

/// Counts active, non-deleted admins other than `exclude_id`. Generic over
/// the connection so the delete cascade can evaluate it against
/// in-transaction state.
pub async fn count_active_admins_excluding<C>(conn: &C, exclude_id: &str) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    users::Entity::find()
        .filter(users::Column::Role.eq("admin"))
        .filter(users::Column::IsActive.eq(true))
        .filter(users::Column::DeletedAt.is_null())
        .filter(users::Column::Id.ne(exclude_id))
        .count(conn)
        .await
}

/// Loads a user inside a transaction, treating absent and soft-deleted rows
/// the same way: the target is unknown or terminal.
async fn load_live_user(
    txn: &DatabaseTransaction,
    target: &str,
) -> Result<users::Model, UserAdminError> {
    let user = users::Entity::find_by_id(target)
        .one(txn)
        .await?
        .ok_or_else(|| UserAdminError::NotFound(format!("user {target} not found")))?;

    if user.deleted_at.is_some() {
        return Err(UserAdminError::NotFound(format!("user {target} not found")));
    }

    Ok(user)
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the library defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Password length policy shared by create and reset. Limits are in
/// characters, not bytes.
pub fn validate_password(password: &str) -> Result<(), UserAdminError> {
    let length = password.chars().count();
    if length < limits::MIN_PASSWORD_LEN || length > limits::MAX_PASSWORD_LEN {
        return Err(UserAdminError::Validation(format!(
            "password must be between {} and {} characters",
            limits::MIN_PASSWORD_LEN,
            limits::MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}
