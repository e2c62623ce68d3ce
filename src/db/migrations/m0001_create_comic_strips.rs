use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ComicStrips::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComicStrips::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ComicStrips::Prompt).text().not_null())
                    .col(ColumnDef::new(ComicStrips::Topic).string().null())
                    .col(ColumnDef::new(ComicStrips::Subject).string().null())
                    .col(ColumnDef::new(ComicStrips::AgeGroup).string().null())
                    .col(ColumnDef::new(ComicStrips::Script).text().not_null())
                    .col(ColumnDef::new(ComicStrips::ImagePath).string().not_null())
                    .col(
                        ColumnDef::new(ComicStrips::PanelCount)
                            .integer()
                            .not_null()
                            .default(4),
                    )
                    .col(
                        ColumnDef::new(ComicStrips::PlaceholderCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ComicStrips::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comic_strips_created_at")
                    .table(ComicStrips::Table)
                    .col(ComicStrips::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ComicStrips::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum ComicStrips {
    Table,
    Id,
    Prompt,
    Topic,
    Subject,
    AgeGroup,
    Script,
    ImagePath,
    PanelCount,
    PlaceholderCount,
    CreatedAt,
}
