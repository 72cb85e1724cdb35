use sea_orm_migration::{prelude::*, schema::*};

use super::m20260115_000001_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profile::Table)
                    .col(pk_uuid(Profile::Id))
                    .col(uuid(Profile::UserId))
                    .col(string(Profile::DisplayName))
                    .col(integer(Profile::Role))
                    .col(string(Profile::Uuid))
                    .col(integer(Profile::Score))
                    .col(integer(Profile::BronzeBadges))
                    .col(integer(Profile::SilverBadges))
                    .col(integer(Profile::GoldBadges))
                    .col(integer(Profile::NewMessages))
                    .col(timestamp_with_time_zone(Profile::LastVisited))
                    .col(integer(Profile::Status))
                    .col(text(Profile::AboutMe))
                    .col(text(Profile::AboutMeHtml))
                    .col(string(Profile::MyTags))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-profile-user_id")
                            .from(Profile::Table, Profile::UserId)
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
                    .name("idx_profile_user_id")
                    .table(Profile::Table)
                    .col(Profile::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_profile_uuid")
                    .table(Profile::Table)
                    .col(Profile::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Profile {
    Table,
    Id,
    UserId,
    DisplayName,
    Role,
    Uuid,
    Score,
    BronzeBadges,
    SilverBadges,
    GoldBadges,
    NewMessages,
    LastVisited,
    Status,
    AboutMe,
    AboutMeHtml,
    MyTags,
}
