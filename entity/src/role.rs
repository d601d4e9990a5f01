use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Name-based permission tier. Higher `level` grants everything below it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub level: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const CUSTOMER: &str = "customer";
pub const STAFF: &str = "staff";
pub const MANAGER: &str = "manager";
pub const ADMIN: &str = "admin";

/// Roles every deployment starts with, as `(name, level)`.
pub const BUILT_IN: [(&str, i32); 4] = [(CUSTOMER, 0), (STAFF, 10), (MANAGER, 20), (ADMIN, 30)];
