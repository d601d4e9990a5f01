use entity::prelude::{
    Category, Drink, DrinkMilk, DrinkSauce, DrinkSyrup, InventoryLog, Milk, Order, Payroll, ProcessedEvent,
    Review, RewardRedemption, Role, Sauce, Shift, Syrup, TempCheckout, User,
};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Parents before children so foreign keys resolve on every backend.
        create_entity(manager, &schema, Role).await?;
        create_entity(manager, &schema, User).await?;
        create_entity(manager, &schema, Category).await?;
        create_entity(manager, &schema, Drink).await?;
        create_entity(manager, &schema, Syrup).await?;
        create_entity(manager, &schema, Sauce).await?;
        create_entity(manager, &schema, Milk).await?;
        create_entity(manager, &schema, DrinkSyrup).await?;
        create_entity(manager, &schema, DrinkSauce).await?;
        create_entity(manager, &schema, DrinkMilk).await?;
        create_entity(manager, &schema, Order).await?;
        create_entity(manager, &schema, Review).await?;
        create_entity(manager, &schema, Shift).await?;
        create_entity(manager, &schema, Payroll).await?;
        create_entity(manager, &schema, InventoryLog).await?;
        create_entity(manager, &schema, RewardRedemption).await?;
        create_entity(manager, &schema, TempCheckout).await?;
        create_entity(manager, &schema, ProcessedEvent).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status")
                    .table(Order)
                    .col(entity::order::Column::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shifts_user_clock_out")
                    .table(Shift)
                    .col(entity::shift::Column::UserId)
                    .col(entity::shift::Column::ClockOut)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity(manager, ProcessedEvent).await?;
        drop_entity(manager, TempCheckout).await?;
        drop_entity(manager, RewardRedemption).await?;
        drop_entity(manager, InventoryLog).await?;
        drop_entity(manager, Payroll).await?;
        drop_entity(manager, Shift).await?;
        drop_entity(manager, Review).await?;
        drop_entity(manager, Order).await?;
        drop_entity(manager, DrinkMilk).await?;
        drop_entity(manager, DrinkSauce).await?;
        drop_entity(manager, DrinkSyrup).await?;
        drop_entity(manager, Milk).await?;
        drop_entity(manager, Sauce).await?;
        drop_entity(manager, Syrup).await?;
        drop_entity(manager, Drink).await?;
        drop_entity(manager, Category).await?;
        drop_entity(manager, User).await?;
        drop_entity(manager, Role).await
    }
}

async fn create_entity<E>(manager: &SchemaManager<'_>, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
        .await
}

async fn drop_entity<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}
