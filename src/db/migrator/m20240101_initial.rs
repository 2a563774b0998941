use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

use crate::constants::{SYSTEM_OWNER_USER_ID, SYSTEM_OWNER_USERNAME};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Bootstrap API token seeded for the root admin. Rotate it after first use.
pub const BOOTSTRAP_ADMIN_TOKEN: &str = "warden_bootstrap_admin_token_please_rotate";

/// Hash the default root admin password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"changeme-now";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        for mut stmt in [
            schema.create_table_from_entity(Users),
            schema.create_table_from_entity(Agents),
            schema.create_table_from_entity(BudgetRequests),
            schema.create_table_from_entity(ApiTokens),
            schema.create_table_from_entity(UserAuditLog),
        ] {
            manager
                .create_table(stmt.if_not_exists().to_owned())
                .await?;
        }

        // Seed the root system admin. It satisfies the at-least-one-admin
        // invariant from the first committed state and is the owner that
        // orphaned agents get reassigned to.
        let now = chrono::Utc::now().timestamp_millis();
        let password_hash = hash_default_password();

        let insert_admin = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Id,
                crate::entities::users::Column::Username,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::Role,
                crate::entities::users::Column::IsActive,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::ForcePasswordChange,
            ])
            .values_panic([
                SYSTEM_OWNER_USER_ID.into(),
                SYSTEM_OWNER_USERNAME.into(),
                password_hash.into(),
                "admin".into(),
                true.into(),
                now.into(),
                true.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert_admin).await?;

        // Bootstrap token so the admin API is reachable before any other
        // token has been issued
        let insert_token = sea_orm_migration::sea_query::Query::insert()
            .into_table(ApiTokens)
            .columns([
                crate::entities::api_tokens::Column::Id,
                crate::entities::api_tokens::Column::Name,
                crate::entities::api_tokens::Column::Token,
                crate::entities::api_tokens::Column::OwnerUserId,
                crate::entities::api_tokens::Column::CreatedAt,
            ])
            .values_panic([
                "tok_bootstrap".into(),
                "bootstrap".into(),
                BOOTSTRAP_ADMIN_TOKEN.into(),
                SYSTEM_OWNER_USER_ID.into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert_token).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserAuditLog).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApiTokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetRequests).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Agents).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
