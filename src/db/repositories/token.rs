use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::db::now_ms;
use crate::entities::{agents, api_tokens, users};
use crate::services::user_service::UserAdminError;

/// The owner a token is issued to: a user or an agent, never both.
#[derive(Debug, Clone)]
pub enum TokenOwner {
    User(String),
    Agent(String),
}

/// Row-level operations on the api_tokens table.
pub struct ApiTokenRepository {
    conn: DatabaseConnection,
}

impl ApiTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Issues a new token. The owner is validated inside the insert
    /// transaction so a token can never be minted for a user that a
    /// concurrent delete cascade has already removed.
    ///
    /// Returns the stored row; the `token` field is the only copy of the
    /// secret the caller will ever see.
    pub async fn issue(
        &self,
        name: &str,
        owner: &TokenOwner,
    ) -> Result<api_tokens::Model, UserAdminError> {
        let txn = self.conn.begin().await?;

        let (owner_user_id, owner_agent_id) = match owner {
            TokenOwner::User(user_id) => {
                let user = users::Entity::find_by_id(user_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| UserAdminError::NotFound(format!("user {user_id} not found")))?;
                if user.deleted_at.is_some() {
                    return Err(UserAdminError::NotFound(format!("user {user_id} not found")));
                }
                (Some(user_id.clone()), None)
            }
            TokenOwner::Agent(agent_id) => {
                agents::Entity::find_by_id(agent_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        UserAdminError::NotFound(format!("agent {agent_id} not found"))
                    })?;
                (None, Some(agent_id.clone()))
            }
        };

        let model = api_tokens::ActiveModel {
            id: Set(format!("tok_{}", uuid::Uuid::new_v4())),
            name: Set(name.to_string()),
            token: Set(generate_token()),
            owner_user_id: Set(owner_user_id),
            owner_agent_id: Set(owner_agent_id),
            created_at: Set(now_ms()),
            revoked_at: Set(None),
            revoked_by: Set(None),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(model)
    }

    /// Resolves a presented secret to its owning user for admin API
    /// authentication. Revoked tokens, agent-owned tokens, and tokens whose
    /// owner is suspended or deleted all resolve to nothing.
    pub async fn verify_admin_token(&self, token: &str) -> Result<Option<users::Model>> {
        let Some(row) = api_tokens::Entity::find()
            .filter(api_tokens::Column::Token.eq(token))
            .filter(api_tokens::Column::RevokedAt.is_null())
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let Some(owner_user_id) = row.owner_user_id else {
            return Ok(None);
        };

        let user = users::Entity::find_by_id(&owner_user_id)
            .one(&self.conn)
            .await?;

        Ok(user.filter(|u| u.is_active && u.deleted_at.is_none()))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<api_tokens::Model>> {
        let token = api_tokens::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(token)
    }

    pub async fn list_all(&self) -> Result<Vec<api_tokens::Model>> {
        let rows = api_tokens::Entity::find()
            .order_by_desc(api_tokens::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<api_tokens::Model>> {
        let rows = api_tokens::Entity::find()
            .filter(api_tokens::Column::OwnerUserId.eq(user_id))
            .order_by_desc(api_tokens::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    /// Marks a token revoked. Revoking an already-revoked token is a no-op
    /// that reports false.
    pub async fn revoke(&self, id: &str, actor: &str) -> Result<bool, UserAdminError> {
        let token = api_tokens::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| UserAdminError::NotFound(format!("token {id} not found")))?;

        if token.revoked_at.is_some() {
            return Ok(false);
        }

        let mut active: api_tokens::ActiveModel = token.into();
        active.revoked_at = Set(Some(now_ms()));
        active.revoked_by = Set(Some(actor.to_string()));
        active.update(&self.conn).await?;

        Ok(true)
    }
}

/// Generate a random API token (64 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
