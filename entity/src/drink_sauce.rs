use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "drink_sauces")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub drink_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub sauce_id: i32,
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
        belongs_to = "super::sauce::Entity",
        from = "Column::SauceId",
        to = "super::sauce::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Sauce,
}

impl ActiveModelBehavior for ActiveModel {}
