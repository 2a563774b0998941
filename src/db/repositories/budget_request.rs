use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::db::now_ms;
use crate::entities::{agents, budget_requests, users};
use crate::services::user_service::UserAdminError;

/// Budget request lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Row-level operations on the budget_requests table.
pub struct BudgetRequestRepository {
    conn: DatabaseConnection,
}

impl BudgetRequestRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Submits a pending request. Requester and agent are validated inside
    /// the insert transaction, mirroring agent creation: a request can never
    /// land under a requester that a concurrent delete has removed.
    pub async fn submit(
        &self,
        requester_id: &str,
        agent_id: &str,
        amount: f64,
        justification: Option<&str>,
    ) -> Result<budget_requests::Model, UserAdminError> {
        let txn = self.conn.begin().await?;

        let requester = users::Entity::find_by_id(requester_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                UserAdminError::NotFound(format!("user {requester_id} not found"))
            })?;
        if requester.deleted_at.is_some() {
            return Err(UserAdminError::NotFound(format!(
                "user {requester_id} not found"
            )));
        }

        agents::Entity::find_by_id(agent_id)
            .one(&txn)
            .await?
            .ok_or_else(|| UserAdminError::NotFound(format!("agent {agent_id} not found")))?;

        let now = now_ms();
        let model = budget_requests::ActiveModel {
            id: Set(format!("breq_{}", uuid::Uuid::new_v4())),
            requester_id: Set(Some(requester_id.to_string())),
            agent_id: Set(agent_id.to_string()),
            amount: Set(amount),
            justification: Set(justification.map(ToString::to_string)),
            status: Set(RequestStatus::Pending.as_str().to_string()),
            review_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(model)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<budget_requests::Model>> {
        let request = budget_requests::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(request)
    }

    pub async fn list(
        &self,
        status: Option<RequestStatus>,
        requester_id: Option<&str>,
    ) -> Result<Vec<budget_requests::Model>> {
        let mut condition = Condition::all();
        if let Some(status) = status {
            condition = condition.add(budget_requests::Column::Status.eq(status.as_str()));
        }
        if let Some(requester) = requester_id {
            condition = condition.add(budget_requests::Column::RequesterId.eq(requester));
        }

        let rows = budget_requests::Entity::find()
            .filter(condition)
            .order_by_desc(budget_requests::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }
}
