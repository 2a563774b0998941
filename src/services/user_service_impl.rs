//! `SeaORM` implementation of the `UserAdminService` trait.

use async_trait::async_trait;

use crate::config::SecurityConfig;
use crate::constants::limits;
use crate::db::Store;
use crate::db::repositories::user::{hash_password, validate_password};
use crate::services::guards::{GuardedOp, check_self_action};
use crate::services::user_service::{
    CreateUserParams, DeleteOutcome, ListUsersFilter, Role, UserAdminError, UserAdminService,
    UserPage, UserSnapshot,
};

pub struct SeaOrmUserAdminService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserAdminService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Argon2id hashing is CPU-heavy, so it runs on the blocking pool.
    async fn hash_on_blocking_pool(&self, password: &str) -> Result<String, UserAdminError> {
        let password = password.to_string();
        let security = self.security.clone();

        tokio::task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .map_err(|e| UserAdminError::Internal(format!("hashing task failed: {e}")))?
            .map_err(UserAdminError::from)
    }
}

fn validate_username(username: &str) -> Result<(), UserAdminError> {
    if username.is_empty() {
        return Err(UserAdminError::Validation(
            "username is required".to_string(),
        ));
    }
    // Limits are in characters, not bytes
    if username.chars().count() > limits::MAX_USERNAME_LEN {
        return Err(UserAdminError::Validation(format!(
            "username must be at most {} characters",
            limits::MAX_USERNAME_LEN
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), UserAdminError> {
    if !email.contains('@') {
        return Err(UserAdminError::Validation(
            "email must contain '@'".to_string(),
        ));
    }
    if email.chars().count() > limits::MAX_EMAIL_LEN {
        return Err(UserAdminError::Validation(format!(
            "email must be at most {} characters",
            limits::MAX_EMAIL_LEN
        )));
    }
    Ok(())
}

#[async_trait]
impl UserAdminService for SeaOrmUserAdminService {
    async fn create_user(
        &self,
        actor: &str,
        params: CreateUserParams,
    ) -> Result<UserSnapshot, UserAdminError> {
        validate_username(&params.username)?;
        if let Some(ref email) = params.email {
            validate_email(email)?;
        }
        validate_password(&params.password)?;

        let password_hash = self.hash_on_blocking_pool(&params.password).await?;

        let model = self
            .store
            .create_user(
                &params.username,
                params.email.as_deref(),
                &password_hash,
                params.role.as_str(),
                actor,
            )
            .await?;

        Ok(model.into())
    }

    async fn list_users(&self, filter: ListUsersFilter) -> Result<UserPage, UserAdminError> {
        let page = filter.page.unwrap_or(1);
        if page == 0 {
            return Err(UserAdminError::Validation(
                "page must be at least 1".to_string(),
            ));
        }

        let page_size = filter
            .page_size
            .unwrap_or(limits::DEFAULT_PAGE_SIZE)
            .min(limits::MAX_PAGE_SIZE);
        if page_size == 0 {
            return Err(UserAdminError::Validation(
                "page_size must be at least 1".to_string(),
            ));
        }

        let (rows, total) = self.store.list_users(&filter, page, page_size).await?;

        Ok(UserPage {
            users: rows.into_iter().map(UserSnapshot::from).collect(),
            total,
            page,
            page_size,
        })
    }

    async fn get_user(&self, target: &str) -> Result<UserSnapshot, UserAdminError> {
        let user = self
            .store
            .get_user_by_id(target)
            .await?
            .ok_or_else(|| UserAdminError::NotFound(format!("user {target} not found")))?;

        Ok(user.into())
    }

    async fn suspend_user(
        &self,
        actor: &str,
        target: &str,
        reason: Option<String>,
    ) -> Result<UserSnapshot, UserAdminError> {
        check_self_action(actor, target, GuardedOp::Suspend)?;
        let model = self.store.suspend_user(target, actor, reason).await?;
        Ok(model.into())
    }

    async fn activate_user(
        &self,
        actor: &str,
        target: &str,
    ) -> Result<UserSnapshot, UserAdminError> {
        check_self_action(actor, target, GuardedOp::Activate)?;
        let model = self.store.activate_user(target, actor).await?;
        Ok(model.into())
    }

    async fn delete_user(
        &self,
        actor: &str,
        target: &str,
    ) -> Result<DeleteOutcome, UserAdminError> {
        // Self and last-admin guards run inside the cascade, which re-checks
        // them against in-transaction state
        let (model, reassignment) = self.store.delete_user_cascade(target, actor).await?;

        Ok(DeleteOutcome {
            user: model.into(),
            reassignment,
        })
    }

    async fn change_role(
        &self,
        actor: &str,
        target: &str,
        new_role: Role,
    ) -> Result<UserSnapshot, UserAdminError> {
        check_self_action(actor, target, GuardedOp::RoleChange)?;
        let model = self
            .store
            .change_user_role(target, actor, new_role.as_str())
            .await?;
        Ok(model.into())
    }

    async fn reset_password(
        &self,
        actor: &str,
        target: &str,
        new_password: &str,
        force_change: bool,
    ) -> Result<UserSnapshot, UserAdminError> {
        check_self_action(actor, target, GuardedOp::PasswordReset)?;
        validate_password(new_password)?;

        let password_hash = self.hash_on_blocking_pool(new_password).await?;

        let model = self
            .store
            .reset_user_password(target, actor, &password_hash, force_change)
            .await?;
        Ok(model.into())
    }
}
