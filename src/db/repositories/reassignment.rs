//! The delete cascade: soft-delete a user and atomically transfer everything
//! it owned to the system fallback.
//!
//! One transaction touches five tables: the user row, its agents, its budget
//! requests, its API tokens, and the audit log. Either the whole cascade
//! commits or none of it is observable. Guard checks run against the state
//! seen inside the transaction, so a retried delete against an id that
//! already committed comes back as not-found rather than a second cascade.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::info;

use crate::constants::{
    AUTO_CANCELLED_NOTE, ORIGINAL_OWNER_TAG_PREFIX, ORPHANED_PROJECT_ID, ORPHANED_TAG,
    SYSTEM_OWNER_USER_ID,
};
use crate::db::now_ms;
use crate::db::repositories::agent::{decode_string_list, encode_string_list};
use crate::db::repositories::audit::{self, AuditOperation, NewAuditEntry};
use crate::db::repositories::user::count_active_admins_excluding;
use crate::entities::{agents, api_tokens, budget_requests, users};
use crate::services::guards::{self, GuardedOp};
use crate::services::user_service::{ReassignedAgent, ReassignmentSummary, UserAdminError};

pub struct ReassignmentEngine {
    conn: DatabaseConnection,
}

impl ReassignmentEngine {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Runs the whole delete cascade for `target`, acting as `actor`.
    ///
    /// Returns the soft-deleted user row and the composite summary that the
    /// audit entry also records.
    pub async fn delete_user(
        &self,
        target: &str,
        actor: &str,
    ) -> Result<(users::Model, ReassignmentSummary), UserAdminError> {
        // Deterministic rejection, no storage access needed
        guards::check_self_action(actor, target, GuardedOp::Delete)?;

        let txn = self.conn.begin().await?;

        let user = users::Entity::find_by_id(target)
            .one(&txn)
            .await?
            .ok_or_else(|| UserAdminError::NotFound(format!("user {target} not found")))?;

        if user.deleted_at.is_some() {
            // Terminal state; a retried delete is idempotent
            return Err(UserAdminError::NotFound(format!("user {target} not found")));
        }

        let target_is_active_admin = user.role == "admin" && user.is_active;
        let other_admins = count_active_admins_excluding(&txn, target).await?;
        guards::check_last_admin(GuardedOp::Delete, target_is_active_admin, other_admins)?;

        let now = now_ms();
        let prev_username = user.username.clone();
        let prev_role = user.role.clone();
        let prev_active = user.is_active;

        let reassigned = reassign_agents(&txn, target).await?;
        let cancelled = cancel_budget_requests(&txn, target, now).await?;
        let revoked = revoke_user_tokens(&txn, target, actor, now).await?;
        let deleted = soft_delete_user(&txn, user, actor, now).await?;

        let summary = ReassignmentSummary {
            agents_reassigned: reassigned.len() as u64,
            reassigned_agents: reassigned,
            budget_requests_cancelled: cancelled,
            api_tokens_revoked: revoked,
        };

        // One composite entry for the whole cascade, inside the same
        // transaction: un-audited deletes cannot commit
        audit::append(
            &txn,
            NewAuditEntry {
                operation: AuditOperation::Delete,
                target_user_id: target,
                performed_by: actor,
                previous_state: Some(serde_json::json!({
                    "username": prev_username,
                    "role": prev_role,
                    "is_active": prev_active,
                })),
                new_state: Some(serde_json::json!({
                    "deleted_at": now,
                    "deleted_by": actor,
                    "agents_reassigned": summary.agents_reassigned,
                    "reassigned_agents": summary
                        .reassigned_agents
                        .iter()
                        .map(|a| a.id.as_str())
                        .collect::<Vec<_>>(),
                    "budget_requests_cancelled": summary.budget_requests_cancelled,
                    "api_tokens_revoked": summary.api_tokens_revoked,
                })),
                reason: None,
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            target_user = target,
            agents = summary.agents_reassigned,
            budget_requests = summary.budget_requests_cancelled,
            tokens = summary.api_tokens_revoked,
            "User deleted, owned resources reassigned"
        );

        Ok((deleted, summary))
    }
}

/// Moves every agent owned by the target into the orphaned fallback project
/// under the system owner, tagging each with its provenance. Budgets,
/// providers, and any operating credentials the agent holds are untouched:
/// this is ownership bookkeeping, never operational state.
async fn reassign_agents(
    txn: &DatabaseTransaction,
    target: &str,
) -> Result<Vec<ReassignedAgent>, UserAdminError> {
    let owned = agents::Entity::find()
        .filter(agents::Column::OwnerId.eq(target))
        .all(txn)
        .await?;

    let mut reassigned = Vec::with_capacity(owned.len());

    for agent in owned {
        let detail = ReassignedAgent {
            id: agent.id.clone(),
            name: agent.name.clone(),
            previous_owner_id: agent.owner_id.clone(),
            previous_project_id: agent.project_id.clone(),
        };

        let mut tags = decode_string_list(&agent.tags);
        let owner_tag = format!("{ORIGINAL_OWNER_TAG_PREFIX}{target}");
        if !tags.iter().any(|t| t == ORPHANED_TAG) {
            tags.push(ORPHANED_TAG.to_string());
        }
        if !tags.iter().any(|t| *t == owner_tag) {
            tags.push(owner_tag);
        }

        let mut active: agents::ActiveModel = agent.into();
        active.owner_id = Set(SYSTEM_OWNER_USER_ID.to_string());
        active.project_id = Set(ORPHANED_PROJECT_ID.to_string());
        active.tags = Set(encode_string_list(&tags));
        active.update(txn).await?;

        reassigned.push(detail);
    }

    Ok(reassigned)
}

/// Cancels the target's pending budget requests and nulls the requester on
/// every one of its requests so no row is left pointing at a deleted user.
/// Non-pending rows survive as historical records. Returns the cancelled
/// count.
async fn cancel_budget_requests(
    txn: &DatabaseTransaction,
    target: &str,
    now: i64,
) -> Result<u64, UserAdminError> {
    let requests = budget_requests::Entity::find()
        .filter(budget_requests::Column::RequesterId.eq(target))
        .all(txn)
        .await?;

    let mut cancelled = 0u64;

    for request in requests {
        let was_pending = request.status == "pending";

        let mut active: budget_requests::ActiveModel = request.into();
        active.requester_id = Set(None);
        if was_pending {
            active.status = Set("cancelled".to_string());
            active.review_notes = Set(Some(AUTO_CANCELLED_NOTE.to_string()));
            cancelled += 1;
        }
        active.updated_at = Set(now);
        active.update(txn).await?;
    }

    Ok(cancelled)
}

/// Revokes every not-yet-revoked token the target owns directly. Tokens
/// owned by the target's agents are deliberately left alone: the agents keep
/// operating under the fallback project.
async fn revoke_user_tokens(
    txn: &DatabaseTransaction,
    target: &str,
    actor: &str,
    now: i64,
) -> Result<u64, UserAdminError> {
    let tokens = api_tokens::Entity::find()
        .filter(api_tokens::Column::OwnerUserId.eq(target))
        .filter(api_tokens::Column::RevokedAt.is_null())
        .all(txn)
        .await?;

    let revoked = tokens.len() as u64;

    for token in tokens {
        let mut active: api_tokens::ActiveModel = token.into();
        active.revoked_at = Set(Some(now));
        active.revoked_by = Set(Some(actor.to_string()));
        active.update(txn).await?;
    }

    Ok(revoked)
}

async fn soft_delete_user(
    txn: &DatabaseTransaction,
    user: users::Model,
    actor: &str,
    now: i64,
) -> Result<users::Model, UserAdminError> {
    let mut active: users::ActiveModel = user.into();
    active.is_active = Set(false);
    active.deleted_at = Set(Some(now));
    active.deleted_by = Set(Some(actor.to_string()));
    let deleted = active.update(txn).await?;
    Ok(deleted)
}
