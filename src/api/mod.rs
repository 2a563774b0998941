use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod agents;
pub mod auth;
mod budget;
mod error;
mod system;
mod tokens;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn crate::services::UserAdminService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn agent_service(&self) -> &Arc<dyn crate::services::AgentService> {
        &self.shared.agent_service
    }
}

#[must_use]
pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/users/{id}/suspend", post(users::suspend_user))
        .route("/users/{id}/activate", post(users::activate_user))
        .route("/users/{id}/role", put(users::change_role))
        .route("/users/{id}/password", put(users::reset_password))
        .route("/users/{id}/audit", get(users::get_user_audit_trail))
        .route("/agents", get(agents::list_agents))
        .route("/agents", post(agents::create_agent))
        .route("/agents/{id}", get(agents::get_agent))
        .route("/tokens", get(tokens::list_tokens))
        .route("/tokens", post(tokens::issue_token))
        .route("/tokens/{id}", get(tokens::get_token))
        .route("/tokens/{id}/revoke", post(tokens::revoke_token))
        .route("/budget-requests", get(budget::list_budget_requests))
        .route("/budget-requests", post(budget::submit_budget_request))
        .route("/budget-requests/{id}", get(budget::get_budget_request))
        .route("/audit", get(system::recent_audit_entries))
        .route("/system/status", get(system::get_status))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
