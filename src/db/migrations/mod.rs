//! Database migrations
use sea_orm_migration::prelude::*;

mod m0001_create_comic_strips;
mod m0002_add_panel_images;

/// Define the Migrator struct
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m0001_create_comic_strips::Migration),
            Box::new(m0002_add_panel_images::Migration),
        ]
    }
}
