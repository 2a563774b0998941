use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AdminPrincipal;
use super::{ApiError, ApiResponse, AuditEntryDto};
use crate::services::user_service::{
    CreateUserParams, DeleteOutcome, ListUsersFilter, Role, UserPage, UserSnapshot,
};

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Role arrives as a raw string and is parsed by the handler, so an unknown
/// role reports through the validation path like every other bad field.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub role: String,
}

#[derive(Deserialize)]
pub struct SuspendRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
    #[serde(default)]
    pub force_password_change: bool,
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    Role::parse(raw)
        .ok_or_else(|| ApiError::validation(format!("unknown role '{raw}'")))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<super::AppState>>,
    Extension(principal): Extension<AdminPrincipal>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserSnapshot>>, ApiError> {
    let role = parse_role(&payload.role)?;

    let user = state
        .user_service()
        .create_user(
            &principal.user_id,
            CreateUserParams {
                username: payload.username,
                password: payload.password,
                email: payload.email,
                role,
            },
        )
        .await?;

    tracing::info!(user_id = %user.id, actor = %principal.user_id, "User created");
    Ok(Json(ApiResponse::success(user)))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<super::AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<UserPage>>, ApiError> {
    let role = query.role.as_deref().map(parse_role).transpose()?;

    let filter = ListUsersFilter {
        role,
        is_active: query.is_active,
        search: query.search,
        page: query.page,
        page_size: query.page_size,
    };

    let page = state.user_service().list_users(filter).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<super::AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserSnapshot>>, ApiError> {
    let user = state.user_service().get_user(&id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// POST /users/{id}/suspend
pub async fn suspend_user(
    State(state): State<Arc<super::AppState>>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    Json(payload): Json<SuspendRequest>,
) -> Result<Json<ApiResponse<UserSnapshot>>, ApiError> {
    let user = state
        .user_service()
        .suspend_user(&principal.user_id, &id, payload.reason)
        .await?;

    tracing::info!(user_id = %id, actor = %principal.user_id, "User suspended");
    Ok(Json(ApiResponse::success(user)))
}

/// POST /users/{id}/activate
pub async fn activate_user(
    State(state): State<Arc<super::AppState>>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserSnapshot>>, ApiError> {
    let user = state
        .user_service()
        .activate_user(&principal.user_id, &id)
        .await?;

    tracing::info!(user_id = %id, actor = %principal.user_id, "User activated");
    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /users/{id}
///
/// Soft delete plus the cascading reassignment of everything the user
/// owned; the response carries the per-resource summary.
pub async fn delete_user(
    State(state): State<Arc<super::AppState>>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteOutcome>>, ApiError> {
    let outcome = state
        .user_service()
        .delete_user(&principal.user_id, &id)
        .await?;

    Ok(Json(ApiResponse::success(outcome)))
}

/// PUT /users/{id}/role
pub async fn change_role(
    State(state): State<Arc<super::AppState>>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<UserSnapshot>>, ApiError> {
    let role = parse_role(&payload.role)?;

    let user = state
        .user_service()
        .change_role(&principal.user_id, &id, role)
        .await?;

    tracing::info!(user_id = %id, actor = %principal.user_id, role = %payload.role, "Role changed");
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /users/{id}/password
pub async fn reset_password(
    State(state): State<Arc<super::AppState>>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<UserSnapshot>>, ApiError> {
    let user = state
        .user_service()
        .reset_password(
            &principal.user_id,
            &id,
            &payload.new_password,
            payload.force_password_change,
        )
        .await?;

    tracing::info!(user_id = %id, actor = %principal.user_id, "Password reset");
    Ok(Json(ApiResponse::success(user)))
}

/// GET /users/{id}/audit
pub async fn get_user_audit_trail(
    State(state): State<Arc<super::AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<AuditEntryDto>>>, ApiError> {
    // 404 for unknown ids; deleted users keep their trail readable
    state
        .store()
        .get_user_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &id))?;

    let entries = state.store().audit_trail_for_user(&id).await?;
    Ok(Json(ApiResponse::success(
        entries.into_iter().map(AuditEntryDto::from).collect(),
    )))
}
