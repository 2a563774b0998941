use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_tokens")]
pub struct Model {
    /// Prefixed UUID (`tok_<uuid4>`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Opaque 64-char hex secret, returned once at issue time
    #[sea_orm(unique)]
    pub token: String,

    /// Exactly one of owner_user_id / owner_agent_id is set
    pub owner_user_id: Option<String>,
    pub owner_agent_id: Option<String>,

    /// Epoch milliseconds
    pub created_at: i64,

    /// Both set or both null
    pub revoked_at: Option<i64>,
    pub revoked_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
