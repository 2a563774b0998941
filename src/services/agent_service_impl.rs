//! `SeaORM` implementation of the `AgentService` trait.

use async_trait::async_trait;

use crate::db::Store;
use crate::services::agent_service::{
    AgentError, AgentService, AgentSnapshot, CreateAgentParams,
};

pub struct SeaOrmAgentService {
    store: Store,
}

impl SeaOrmAgentService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AgentService for SeaOrmAgentService {
    async fn create_agent(&self, params: CreateAgentParams) -> Result<AgentSnapshot, AgentError> {
        if params.name.is_empty() {
            return Err(AgentError::Validation("agent name is required".to_string()));
        }
        if params.budget < 0.0 || !params.budget.is_finite() {
            return Err(AgentError::Validation(
                "budget must be a non-negative number".to_string(),
            ));
        }

        let model = self
            .store
            .create_agent(
                &params.name,
                &params.owner_id,
                params.project_id.as_deref(),
                params.budget,
                &params.providers,
                &params.tags,
            )
            .await?;

        Ok(model.into())
    }

    async fn get_agent(&self, id: &str) -> Result<AgentSnapshot, AgentError> {
        let agent = self
            .store
            .get_agent(id)
            .await?
            .ok_or_else(|| AgentError::NotFound(id.to_string()))?;
        Ok(agent.into())
    }

    async fn list_agents(&self, owner_id: Option<&str>) -> Result<Vec<AgentSnapshot>, AgentError> {
        let rows = match owner_id {
            Some(owner) => self.store.list_agents_by_owner(owner).await?,
            None => self.store.list_agents().await?,
        };
        Ok(rows.into_iter().map(AgentSnapshot::from).collect())
    }
}
