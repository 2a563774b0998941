use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::budget_request::RequestStatus;
pub use repositories::token::TokenOwner;

use crate::entities::{agents, api_tokens, budget_requests, user_audit_log, users};
use crate::services::agent_service::AgentError;
use crate::services::user_service::{
    ListUsersFilter, ReassignmentSummary, UserAdminError,
};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("::memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn agent_repo(&self) -> repositories::agent::AgentRepository {
        repositories::agent::AgentRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::ApiTokenRepository {
        repositories::token::ApiTokenRepository::new(self.conn.clone())
    }

    fn budget_repo(&self) -> repositories::budget_request::BudgetRequestRepository {
        repositories::budget_request::BudgetRequestRepository::new(self.conn.clone())
    }

    fn audit_repo(&self) -> repositories::audit::AuditLogRepository {
        repositories::audit::AuditLogRepository::new(self.conn.clone())
    }

    fn reassignment_engine(&self) -> repositories::reassignment::ReassignmentEngine {
        repositories::reassignment::ReassignmentEngine::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn list_users(
        &self,
        filter: &ListUsersFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<users::Model>, u64)> {
        self.user_repo().list(filter, page, page_size).await
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
        role: &str,
        actor: &str,
    ) -> Result<users::Model, UserAdminError> {
        self.user_repo()
            .create(username, email, password_hash, role, actor)
            .await
    }

    pub async fn suspend_user(
        &self,
        target: &str,
        actor: &str,
        reason: Option<String>,
    ) -> Result<users::Model, UserAdminError> {
        self.user_repo().suspend(target, actor, reason).await
    }

    pub async fn activate_user(
        &self,
        target: &str,
        actor: &str,
    ) -> Result<users::Model, UserAdminError> {
        self.user_repo().activate(target, actor).await
    }

    pub async fn change_user_role(
        &self,
        target: &str,
        actor: &str,
        new_role: &str,
    ) -> Result<users::Model, UserAdminError> {
        self.user_repo().change_role(target, actor, new_role).await
    }

    pub async fn reset_user_password(
        &self,
        target: &str,
        actor: &str,
        password_hash: &str,
        force_change: bool,
    ) -> Result<users::Model, UserAdminError> {
        self.user_repo()
            .reset_password(target, actor, password_hash, force_change)
            .await
    }

    /// The delete cascade: soft delete plus atomic reassignment of every
    /// owned resource. See `repositories::reassignment`.
    pub async fn delete_user_cascade(
        &self,
        target: &str,
        actor: &str,
    ) -> Result<(users::Model, ReassignmentSummary), UserAdminError> {
        self.reassignment_engine().delete_user(target, actor).await
    }

    // ========== Agents ==========

    pub async fn create_agent(
        &self,
        name: &str,
        owner_id: &str,
        project_id: Option<&str>,
        budget: f64,
        providers: &[String],
        tags: &[String],
    ) -> Result<agents::Model, AgentError> {
        self.agent_repo()
            .create(name, owner_id, project_id, budget, providers, tags)
            .await
    }

    pub async fn get_agent(&self, id: &str) -> Result<Option<agents::Model>> {
        self.agent_repo().get_by_id(id).await
    }

    pub async fn list_agents(&self) -> Result<Vec<agents::Model>> {
        self.agent_repo().list_all().await
    }

    pub async fn list_agents_by_owner(&self, owner_id: &str) -> Result<Vec<agents::Model>> {
        self.agent_repo().list_by_owner(owner_id).await
    }

    // ========== API tokens ==========

    pub async fn issue_token(
        &self,
        name: &str,
        owner: &TokenOwner,
    ) -> Result<api_tokens::Model, UserAdminError> {
        self.token_repo().issue(name, owner).await
    }

    pub async fn verify_admin_token(&self, token: &str) -> Result<Option<users::Model>> {
        self.token_repo().verify_admin_token(token).await
    }

    pub async fn get_token(&self, id: &str) -> Result<Option<api_tokens::Model>> {
        self.token_repo().get_by_id(id).await
    }

    pub async fn list_tokens(&self) -> Result<Vec<api_tokens::Model>> {
        self.token_repo().list_all().await
    }

    pub async fn list_tokens_for_user(&self, user_id: &str) -> Result<Vec<api_tokens::Model>> {
        self.token_repo().list_for_user(user_id).await
    }

    pub async fn revoke_token(&self, id: &str, actor: &str) -> Result<bool, UserAdminError> {
        self.token_repo().revoke(id, actor).await
    }

    // ========== Budget requests ==========

    pub async fn submit_budget_request(
        &self,
        requester_id: &str,
        agent_id: &str,
        amount: f64,
        justification: Option<&str>,
    ) -> Result<budget_requests::Model, UserAdminError> {
        self.budget_repo()
            .submit(requester_id, agent_id, amount, justification)
            .await
    }

    pub async fn get_budget_request(&self, id: &str) -> Result<Option<budget_requests::Model>> {
        self.budget_repo().get_by_id(id).await
    }

    pub async fn list_budget_requests(
        &self,
        status: Option<RequestStatus>,
        requester_id: Option<&str>,
    ) -> Result<Vec<budget_requests::Model>> {
        self.budget_repo().list(status, requester_id).await
    }

    // ========== Audit trail ==========

    pub async fn audit_trail_for_user(
        &self,
        target: &str,
    ) -> Result<Vec<user_audit_log::Model>> {
        self.audit_repo().list_for_user(target).await
    }

    pub async fn recent_audit_entries(&self, limit: u64) -> Result<Vec<user_audit_log::Model>> {
        self.audit_repo().recent(limit).await
    }
}

/// Current time in epoch milliseconds, the timestamp unit used across all
/// tables.
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
