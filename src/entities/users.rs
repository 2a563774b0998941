use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Prefixed UUID (`user_<uuid4>`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub email: Option<String>,

    /// Argon2id password hash, never serialized outward
    pub password_hash: String,

    /// One of `viewer`, `user`, `admin`
    pub role: String,

    pub is_active: bool,

    /// Epoch milliseconds
    pub created_at: i64,

    pub last_login: Option<i64>,

    /// Both set or both null
    pub suspended_at: Option<i64>,
    pub suspended_by: Option<String>,

    /// Terminal once set; both set or both null
    pub deleted_at: Option<i64>,
    pub deleted_by: Option<String>,

    pub force_password_change: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
