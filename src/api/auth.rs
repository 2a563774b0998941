use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

use super::AppState;

/// The authenticated acting admin, resolved from the presented API token.
/// Handlers read this from request extensions to pass the actor id into
/// every mutating operation.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub user_id: String,
    pub username: String,
}

/// Authentication middleware that checks:
/// 1. `X-Api-Key` header
/// 2. `Authorization: Bearer <token>` header
///
/// The token must resolve to an active, non-deleted user with the admin
/// role; everything behind this middleware is admin-only.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> impl IntoResponse {
    let Some(token) = extract_api_key(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    match state.store().verify_admin_token(&token).await {
        Ok(Some(user)) if user.role == "admin" => {
            tracing::Span::current().record("user_id", &user.id);
            request.extensions_mut().insert(AdminPrincipal {
                user_id: user.id,
                username: user.username,
            });
            next.run(request).await
        }
        Ok(Some(_)) => (StatusCode::FORBIDDEN, "Admin role required").into_response(),
        Ok(None) => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
        Err(e) => {
            tracing::error!("Token verification error: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

/// Extract API token from headers
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    // Check X-Api-Key header
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    // Check Authorization: Bearer header
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}
