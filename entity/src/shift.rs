use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A worked shift. `clock_out` stays empty while the shift is open.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shifts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub store_number: Option<String>,
    pub clock_in: DateTimeUtc,
    pub clock_out: Option<DateTimeUtc>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub hours: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
