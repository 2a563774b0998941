use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AuditEntryDto};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: u64,
    pub database_ok: bool,
}

#[derive(Deserialize)]
pub struct RecentAuditQuery {
    pub limit: Option<u64>,
}

/// GET /system/status
pub async fn get_status(
    State(state): State<Arc<super::AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let database_ok = state.store().ping().await.is_ok();

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database_ok,
    })))
}

/// GET /audit
pub async fn recent_audit_entries(
    State(state): State<Arc<super::AppState>>,
    Query(query): Query<RecentAuditQuery>,
) -> Result<Json<ApiResponse<Vec<AuditEntryDto>>>, ApiError> {
    let limit = query.limit.unwrap_or(100).min(1000);
    let entries = state.store().recent_audit_entries(limit).await?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(AuditEntryDto::from).collect(),
    )))
}
