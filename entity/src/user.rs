use super::sea_orm_active_enums::Tier;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Subject assigned by the identity provider.
    #[sea_orm(unique)]
    pub external_id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub role_id: i32,
    pub tier: Tier,
    /// Spendable balance.
    pub points: i64,
    /// Everything ever earned; the tier is derived from this.
    pub lifetime_points: i64,
    pub employee_number: Option<String>,
    pub store_number: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Role,
    #[sea_orm(has_many = "super::order::Entity")]
    Order,
    #[sea_orm(has_many = "super::shift::Entity")]
    Shift,
    #[sea_orm(has_many = "super::payroll::Entity")]
    Payroll,
    #[sea_orm(has_many = "super::reward_redemption::Entity")]
    RewardRedemption,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::shift::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shift.def()
    }
}

impl Related<super::payroll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payroll.def()
    }
}

impl Related<super::reward_redemption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RewardRedemption.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
