//! Domain service for delegated compute agents.
//!
//! Agents are owned by users and carry a project assignment, a budget, and
//! JSON-encoded provider/tag lists. Ownership is validated at creation time
//! inside the insert transaction.

use serde::Serialize;
use thiserror::Error;

use crate::db::repositories::agent::decode_string_list;
use crate::entities::agents;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Owner user {0} not found")]
    OwnerNotFound(String),

    #[error("Agent {0} not found")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AgentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Agent data returned from the service, with providers and tags decoded
/// from their stored JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub project_id: String,
    pub budget: f64,
    pub providers: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: i64,
}

impl From<agents::Model> for AgentSnapshot {
    fn from(model: agents::Model) -> Self {
        Self {
            providers: decode_string_list(&model.providers),
            tags: decode_string_list(&model.tags),
            id: model.id,
            name: model.name,
            owner_id: model.owner_id,
            project_id: model.project_id,
            budget: model.budget,
            created_at: model.created_at,
        }
    }
}

/// Agent creation parameters.
#[derive(Debug, Clone)]
pub struct CreateAgentParams {
    pub name: String,
    pub owner_id: String,
    /// Defaults to the shared default project when absent
    pub project_id: Option<String>,
    pub budget: f64,
    pub providers: Vec<String>,
    pub tags: Vec<String>,
}

#[async_trait::async_trait]
pub trait AgentService: Send + Sync {
    /// Registers a new agent under an existing, non-deleted owner.
    ///
    /// # Errors
    ///
    /// [`AgentError::Validation`] on malformed input,
    /// [`AgentError::OwnerNotFound`] when the owner is absent or deleted.
    async fn create_agent(&self, params: CreateAgentParams) -> Result<AgentSnapshot, AgentError>;

    /// Gets a single agent by id.
    async fn get_agent(&self, id: &str) -> Result<AgentSnapshot, AgentError>;

    /// Lists all agents, newest first.
    async fn list_agents(&self, owner_id: Option<&str>) -> Result<Vec<AgentSnapshot>, AgentError>;
}
