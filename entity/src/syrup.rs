use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "syrups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::drink::Entity> for Entity {
    fn to() -> RelationDef {
        super::drink_syrup::Relation::Drink.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::drink_syrup::Relation::Syrup.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
