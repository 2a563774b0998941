use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "agents")]
pub struct Model {
    /// Prefixed UUID (`agent_<uuid4>`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Owning user. Bookkeeping only: the agent keeps operating whatever
    /// happens to the owner's account.
    pub owner_id: String,

    pub project_id: String,

    /// Budget in dollars
    pub budget: f64,

    /// JSON array of provider names
    pub providers: String,

    /// JSON array of tags, ordered, duplicate-free
    pub tags: String,

    /// Epoch milliseconds
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
