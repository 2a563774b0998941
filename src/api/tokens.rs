use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AdminPrincipal;
use super::{ApiError, ApiResponse, IssueTokenRequest, IssuedTokenDto, TokenDto};
use crate::db::TokenOwner;

#[derive(Deserialize)]
pub struct ListTokensQuery {
    pub owner_user_id: Option<String>,
}

/// POST /tokens
///
/// The response is the only place the secret is ever returned.
pub async fn issue_token(
    State(state): State<Arc<super::AppState>>,
    Json(payload): Json<IssueTokenRequest>,
) -> Result<Json<ApiResponse<IssuedTokenDto>>, ApiError> {
    if payload.name.is_empty() {
        return Err(ApiError::validation("token name is required"));
    }

    let owner = match (payload.owner_user_id, payload.owner_agent_id) {
        (Some(user_id), None) => TokenOwner::User(user_id),
        (None, Some(agent_id)) => TokenOwner::Agent(agent_id),
        _ => {
            return Err(ApiError::validation(
                "exactly one of owner_user_id or owner_agent_id is required",
            ));
        }
    };

    let token = state.store().issue_token(&payload.name, &owner).await?;

    tracing::info!(token_id = %token.id, "API token issued");
    Ok(Json(ApiResponse::success(token.into())))
}

/// GET /tokens
pub async fn list_tokens(
    State(state): State<Arc<super::AppState>>,
    Query(query): Query<ListTokensQuery>,
) -> Result<Json<ApiResponse<Vec<TokenDto>>>, ApiError> {
    let rows = match query.owner_user_id.as_deref() {
        Some(owner) => state.store().list_tokens_for_user(owner).await?,
        None => state.store().list_tokens().await?,
    };

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(TokenDto::from).collect(),
    )))
}

/// GET /tokens/{id}
pub async fn get_token(
    State(state): State<Arc<super::AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TokenDto>>, ApiError> {
    let token = state
        .store()
        .get_token(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Token", &id))?;

    Ok(Json(ApiResponse::success(token.into())))
}

/// POST /tokens/{id}/revoke
pub async fn revoke_token(
    State(state): State<Arc<super::AppState>>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TokenDto>>, ApiError> {
    let newly_revoked = state.store().revoke_token(&id, &principal.user_id).await?;

    if newly_revoked {
        tracing::info!(token_id = %id, actor = %principal.user_id, "API token revoked");
    }

    let token = state
        .store()
        .get_token(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Token", &id))?;

    Ok(Json(ApiResponse::success(token.into())))
}
