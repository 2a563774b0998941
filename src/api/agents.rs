use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, CreateAgentRequest};
use crate::services::agent_service::{AgentSnapshot, CreateAgentParams};

#[derive(Deserialize)]
pub struct ListAgentsQuery {
    pub owner_id: Option<String>,
}

/// POST /agents
pub async fn create_agent(
    State(state): State<Arc<super::AppState>>,
    Json(payload): Json<CreateAgentRequest>,
) -> Result<Json<ApiResponse<AgentSnapshot>>, ApiError> {
    let agent = state
        .agent_service()
        .create_agent(CreateAgentParams {
            name: payload.name,
            owner_id: payload.owner_id,
            project_id: payload.project_id,
            budget: payload.budget,
            providers: payload.providers,
            tags: payload.tags,
        })
        .await?;

    tracing::info!(agent_id = %agent.id, owner = %agent.owner_id, "Agent created");
    Ok(Json(ApiResponse::success(agent)))
}

/// GET /agents
pub async fn list_agents(
    State(state): State<Arc<super::AppState>>,
    Query(query): Query<ListAgentsQuery>,
) -> Result<Json<ApiResponse<Vec<AgentSnapshot>>>, ApiError> {
    let agents = state
        .agent_service()
        .list_agents(query.owner_id.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(agents)))
}

/// GET /agents/{id}
pub async fn get_agent(
    State(state): State<Arc<super::AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AgentSnapshot>>, ApiError> {
    let agent = state.agent_service().get_agent(&id).await?;
    Ok(Json(ApiResponse::success(agent)))
}
