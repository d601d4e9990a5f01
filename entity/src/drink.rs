use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "drinks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub base_price: Decimal,
    pub category_id: i32,
    pub image_url: Option<String>,
    pub available: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::syrup::Entity> for Entity {
    fn to() -> RelationDef {
        super::drink_syrup::Relation::Syrup.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::drink_syrup::Relation::Drink.def().rev())
    }
}

impl Related<super::sauce::Entity> for Entity {
    fn to() -> RelationDef {
        super::drink_sauce::Relation::Sauce.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::drink_sauce::Relation::Drink.def().rev())
    }
}

impl Related<super::milk::Entity> for Entity {
    fn to() -> RelationDef {
        super::drink_milk::Relation::Milk.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::drink_milk::Relation::Drink.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
