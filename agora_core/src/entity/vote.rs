use crate::ids::{PostId, UserId, VoteId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's vote on a post. At most one vote of a given kind per (author,
/// post); up and down votes oppose each other.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: VoteId,
    pub author_id: UserId,
    pub post_id: PostId,
    pub kind: VoteKind,
    pub date: DateTimeUtc,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum VoteKind {
    #[sea_orm(num_value = 0)]
    Up,
    #[sea_orm(num_value = 1)]
    Down,
    #[sea_orm(num_value = 2)]
    Accept,
    #[sea_orm(num_value = 3)]
    Bookmark,
}

impl VoteKind {
    /// Casting a vote removes any existing vote of the opposing kind.
    pub fn opposing(self) -> Option<VoteKind> {
        match self {
            VoteKind::Up => Some(VoteKind::Down),
            VoteKind::Down => Some(VoteKind::Up),
            VoteKind::Accept | VoteKind::Bookmark => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VoteKind::Up => "up vote",
            VoteKind::Down => "down vote",
            VoteKind::Accept => "accept",
            VoteKind::Bookmark => "bookmark",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
