use entity::role;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for (name, level) in role::BUILT_IN {
            role::ActiveModel {
                name: Set(name.to_owned()),
                level: Set(level),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        role::Entity::delete_many()
            .filter(role::Column::Name.is_in(role::BUILT_IN.map(|(name, _)| name)))
            .exec(db)
            .await?;

        Ok(())
    }
}
