pub use sea_orm_migration::prelude::*;

mod m20250101_000001_settings;
mod m20250101_000002_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_settings::Migration),
            Box::new(m20250101_000002_transactions::Migration),
        ]
    }
}
