use sea_orm_migration::{prelude::*, schema::*};

use super::m20260115_000001_create_user_table::User;
use super::m20260115_000007_create_badge_table::Badge;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Award::Table)
                    .col(pk_uuid(Award::Id))
                    .col(uuid(Award::BadgeId))
                    .col(uuid(Award::UserId))
                    .col(timestamp_with_time_zone(Award::Date))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-award-badge_id")
                            .from(Award::Table, Award::BadgeId)
                            .to(Badge::Table, Badge::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-award-user_id")
                            .from(Award::Table, Award::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_award_user_id")
                    .table(Award::Table)
                    .col(Award::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Award::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Award {
    Table,
    Id,
    BadgeId,
    UserId,
    Date,
}
