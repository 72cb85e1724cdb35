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
                    .table(Note::Table)
                    .col(pk_uuid(Note::Id))
                    .col(uuid(Note::SenderId))
                    .col(uuid(Note::TargetId))
                    .col(text(Note::Content))
                    .col(text(Note::Html))
                    .col(timestamp_with_time_zone(Note::Date))
                    .col(boolean(Note::Unread))
                    .col(integer(Note::Kind))
                    .col(string(Note::Url))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-note-sender_id")
                            .from(Note::Table, Note::SenderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-note-target_id")
                            .from(Note::Table, Note::TargetId)
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
                    .name("idx_note_target_unread")
                    .table(Note::Table)
                    .col(Note::TargetId)
                    .col(Note::Unread)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Note::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Note {
    Table,
    Id,
    SenderId,
    TargetId,
    Content,
    Html,
    Date,
    Unread,
    Kind,
    Url,
}
