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
                    .table(Post::Table)
                    .col(pk_uuid(Post::Id))
                    .col(uuid(Post::AuthorId))
                    .col(uuid(Post::LasteditUserId))
                    .col(text(Post::Content))
                    .col(text(Post::Html))
                    .col(string(Post::Title))
                    .col(string(Post::Slug))
                    .col(string(Post::TagVal))
                    .col(integer(Post::Kind))
                    .col(integer(Post::Status))
                    .col(integer(Post::Score))
                    .col(integer(Post::FullScore))
                    .col(double(Post::Rank))
                    .col(integer(Post::Views))
                    .col(timestamp_with_time_zone(Post::CreationDate))
                    .col(timestamp_with_time_zone(Post::LasteditDate))
                    .col(uuid(Post::RootId))
                    .col(uuid(Post::ParentId))
                    .col(integer(Post::CommentCount))
                    .col(integer(Post::AnswerCount))
                    .col(integer(Post::RevisionCount))
                    .col(boolean(Post::Accepted))
                    .col(string(Post::Url))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post-author_id")
                            .from(Post::Table, Post::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post-lastedit_user_id")
                            .from(Post::Table, Post::LasteditUserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    // Self references maintain the ancestor/descendant and
                    // parent/child relationships between posts.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post-root_id")
                            .from(Post::Table, Post::RootId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post-parent_id")
                            .from(Post::Table, Post::ParentId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_root_id")
                    .table(Post::Table)
                    .col(Post::RootId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_parent_id")
                    .table(Post::Table)
                    .col(Post::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_kind")
                    .table(Post::Table)
                    .col(Post::Kind)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_rank")
                    .table(Post::Table)
                    .col(Post::Rank)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_creation_date")
                    .table(Post::Table)
                    .col(Post::CreationDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Post {
    Table,
    Id,
    AuthorId,
    LasteditUserId,
    Content,
    Html,
    Title,
    Slug,
    TagVal,
    Kind,
    Status,
    Score,
    FullScore,
    Rank,
    Views,
    CreationDate,
    LasteditDate,
    RootId,
    ParentId,
    CommentCount,
    AnswerCount,
    RevisionCount,
    Accepted,
    Url,
}
