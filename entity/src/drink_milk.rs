use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "drink_milks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub drink_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub milk_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::drink::Entity",
        from = "Column::DrinkId",
        to = "super::drink::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Drink,
    #[sea_orm(
        belongs_to = "super::milk::Entity",
        from = "Column::MilkId",
        to = "super::milk::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Milk,
}

impl ActiveModelBehavior for ActiveModel {}
