use super::sea_orm_active_enums::{OrderStatus, PaymentStatus};
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub items: OrderItems,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Checkout session the order was paid through.
    #[sea_orm(unique)]
    pub session_id: String,
    pub payment_intent: Option<String>,
    pub points_awarded: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Size of a handcrafted drink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrinkSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// One priced cart line, frozen at checkout time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub drink_id: i32,
    pub drink_name: String,
    pub size: DrinkSize,
    pub quantity: i32,
    pub milk: Option<String>,
    pub syrups: Vec<String>,
    pub sauces: Vec<String>,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct OrderItems(pub Vec<OrderItem>);

impl OrderItems {
    pub fn quantity(&self) -> i64 {
        self.0.iter().map(|item| i64::from(item.quantity)).sum()
    }
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
    #[sea_orm(has_one = "super::review::Entity")]
    Review,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
