pub use sea_orm_migration::prelude::*;

mod m20251001_000000_init;
mod m20251020_090000_checkout_sessions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000000_init::Migration),
            Box::new(m20251020_090000_checkout_sessions::Migration),
        ]
    }
}
