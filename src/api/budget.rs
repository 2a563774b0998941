use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, BudgetRequestDto, SubmitBudgetRequest};
use crate::db::RequestStatus;

#[derive(Deserialize)]
pub struct ListBudgetRequestsQuery {
    pub status: Option<String>,
    pub requester_id: Option<String>,
}

/// POST /budget-requests
pub async fn submit_budget_request(
    State(state): State<Arc<super::AppState>>,
    Json(payload): Json<SubmitBudgetRequest>,
) -> Result<Json<ApiResponse<BudgetRequestDto>>, ApiError> {
    if payload.amount <= 0.0 || !payload.amount.is_finite() {
        return Err(ApiError::validation("amount must be a positive number"));
    }

    let request = state
        .store()
        .submit_budget_request(
            &payload.requester_id,
            &payload.agent_id,
            payload.amount,
            payload.justification.as_deref(),
        )
        .await?;

    tracing::info!(request_id = %request.id, requester = %payload.requester_id, "Budget request submitted");
    Ok(Json(ApiResponse::success(request.into())))
}

/// GET /budget-requests
pub async fn list_budget_requests(
    State(state): State<Arc<super::AppState>>,
    Query(query): Query<ListBudgetRequestsQuery>,
) -> Result<Json<ApiResponse<Vec<BudgetRequestDto>>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|raw| {
            RequestStatus::parse(raw)
                .ok_or_else(|| ApiError::validation(format!("unknown status '{raw}'")))
        })
        .transpose()?;

    let rows = state
        .store()
        .list_budget_requests(status, query.requester_id.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(BudgetRequestDto::from).collect(),
    )))
}

/// GET /budget-requests/{id}
pub async fn get_budget_request(
    State(state): State<Arc<super::AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BudgetRequestDto>>, ApiError> {
    let request = state
        .store()
        .get_budget_request(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Budget request", &id))?;

    Ok(Json(ApiResponse::success(request.into())))
}
