pub use sea_orm_migration::prelude::*;

mod m20240105_000001_create_tables;
mod m20240105_000002_seed_roles;
mod m20240105_000003_seed_menu;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240105_000001_create_tables::Migration),
            Box::new(m20240105_000002_seed_roles::Migration),
            Box::new(m20240105_000003_seed_menu::Migration),
        ]
    }
}
