pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_customers;
mod m20250101_000002_create_declarations;
mod m20250101_000003_create_content;
mod m20250101_000004_create_lookups;
pub mod entity_iden;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_customers::Migration),
            Box::new(m20250101_000002_create_declarations::Migration),
            Box::new(m20250101_000003_create_content::Migration),
            Box::new(m20250101_000004_create_lookups::Migration),
        ]
    }
}
