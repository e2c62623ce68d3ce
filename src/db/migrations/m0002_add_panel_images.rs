use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // JSON list of per-panel image paths, relative to the media root
        manager
            .alter_table(
                Table::alter()
                    .table(ComicStrips::Table)
                    .add_column(
                        ColumnDef::new(ComicStrips::PanelImages)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(ComicStrips::Table)
                    .drop_column(ComicStrips::PanelImages)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum ComicStrips {
    Table,
    PanelImages,
}
