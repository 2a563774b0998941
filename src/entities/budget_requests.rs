use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_requests")]
pub struct Model {
    /// Prefixed UUID (`breq_<uuid4>`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Nulled (not left dangling) when the requester is deleted
    pub requester_id: Option<String>,

    pub agent_id: String,

    /// Requested budget in dollars
    pub amount: f64,

    pub justification: Option<String>,

    /// One of `pending`, `approved`, `rejected`, `cancelled`
    pub status: String,

    pub review_notes: Option<String>,

    /// Epoch milliseconds
    pub created_at: i64,

    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
