use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Badge::Table)
                    .col(pk_uuid(Badge::Id))
                    .col(string(Badge::Name))
                    .col(string(Badge::Description))
                    .col(integer(Badge::Tier))
                    .col(boolean(Badge::Unique))
                    .col(boolean(Badge::Secret))
                    .col(integer(Badge::Count))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Badge::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Badge {
    Table,
    Id,
    Name,
    Description,
    Tier,
    Unique,
    Secret,
    Count,
}
