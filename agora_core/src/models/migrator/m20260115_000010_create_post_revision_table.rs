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
                    .table(PostRevision::Table)
                    .col(pk_uuid(PostRevision::Id))
                    .col(uuid(PostRevision::PostId))
                    .col(uuid(PostRevision::AuthorId))
                    .col(timestamp_with_time_zone(PostRevision::Date))
                    .col(text(PostRevision::Diff))
                    .col(text(PostRevision::Content))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post_revision-post_id")
                            .from(PostRevision::Table, PostRevision::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post_revision-author_id")
                            .from(PostRevision::Table, PostRevision::AuthorId)
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
                    .name("idx_post_revision_post_date")
                    .table(PostRevision::Table)
                    .col(PostRevision::PostId)
                    .col(PostRevision::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostRevision::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PostRevision {
    Table,
    Id,
    PostId,
    AuthorId,
    Date,
    Diff,
    Content,
}
