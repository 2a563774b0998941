use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::constants::DEFAULT_PROJECT_ID;
use crate::db::now_ms;
use crate::entities::{agents, users};
use crate::services::agent_service::AgentError;

/// Row-level operations on the agents table.
pub struct AgentRepository {
    conn: DatabaseConnection,
}

impl AgentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a new agent after validating the owner inside the same
    /// transaction. Creation therefore orders cleanly against an in-flight
    /// delete of the owner: either this commit lands first and the delete
    /// cascade sweeps the agent, or the owner is already gone and this
    /// fails. No interleaving leaves an agent owned by a deleted user.
    pub async fn create(
        &self,
        name: &str,
        owner_id: &str,
        project_id: Option<&str>,
        budget: f64,
        providers: &[String],
        tags: &[String],
    ) -> Result<agents::Model, AgentError> {
        let txn = self.conn.begin().await?;

        let owner = users::Entity::find_by_id(owner_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AgentError::OwnerNotFound(owner_id.to_string()))?;
        if owner.deleted_at.is_some() {
            return Err(AgentError::OwnerNotFound(owner_id.to_string()));
        }

        let model = agents::ActiveModel {
            id: Set(format!("agent_{}", uuid::Uuid::new_v4())),
            name: Set(name.to_string()),
            owner_id: Set(owner_id.to_string()),
            project_id: Set(project_id.unwrap_or(DEFAULT_PROJECT_ID).to_string()),
            budget: Set(budget),
            providers: Set(encode_string_list(providers)),
            tags: Set(encode_string_list(tags)),
            created_at: Set(now_ms()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(model)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<agents::Model>> {
        let agent = agents::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(agent)
    }

    pub async fn list_all(&self) -> Result<Vec<agents::Model>> {
        let rows = agents::Entity::find()
            .order_by_desc(agents::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<agents::Model>> {
        let rows = agents::Entity::find()
            .filter(agents::Column::OwnerId.eq(owner_id))
            .order_by_desc(agents::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }
}

/// Providers and tags are stored as JSON arrays in TEXT columns.
/// A malformed cell decodes as empty rather than poisoning the read path.
#[must_use]
pub fn decode_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[must_use]
pub fn encode_string_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
