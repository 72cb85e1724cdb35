use crate::ids::{NoteId, UserId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A simple notification, active until the target reads or deletes it.
/// While unread it contributes to the target profile's new-message counter.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "note")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: NoteId,
    pub sender_id: UserId,
    pub target_id: UserId,
    /// Raw message.
    pub content: String,
    /// Sanitized content.
    pub html: String,
    pub date: DateTimeUtc,
    pub unread: bool,
    pub kind: NoteKind,
    pub url: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum NoteKind {
    #[sea_orm(num_value = 0)]
    User,
    #[sea_orm(num_value = 1)]
    Moderator,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TargetId",
        to = "super::user::Column::Id"
    )]
    Target,
}

impl ActiveModelBehavior for ActiveModel {}
