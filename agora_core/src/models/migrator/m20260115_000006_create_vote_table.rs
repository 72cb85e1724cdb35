use sea_orm_migration::{prelude::*, schema::*};

use super::m20260115_000001_create_user_table::User;
use super::m20260115_000003_create_post_table::Post;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .col(pk_uuid(Vote::Id))
                    .col(uuid(Vote::AuthorId))
                    .col(uuid(Vote::PostId))
                    .col(integer(Vote::Kind))
                    .col(timestamp_with_time_zone(Vote::Date))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-vote-author_id")
                            .from(Vote::Table, Vote::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-vote-post_id")
                            .from(Vote::Table, Vote::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One active vote of a given kind per (author, post). Removes the
        // duplicate-submission race structurally; the vote service still
        // collapses duplicates defensively before inserting.
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_author_post_kind")
                    .table(Vote::Table)
                    .col(Vote::AuthorId)
                    .col(Vote::PostId)
                    .col(Vote::Kind)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vote_post_id")
                    .table(Vote::Table)
                    .col(Vote::PostId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vote {
    Table,
    Id,
    AuthorId,
    PostId,
    Kind,
    Date,
}
