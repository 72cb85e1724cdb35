use crate::ids::{ProfileId, UserId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-user options and denormalized reputation/badge tallies.
/// Created automatically when the user is created, destroyed with it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: ProfileId,
    #[sea_orm(unique)]
    pub user_id: UserId,
    pub display_name: String,
    pub role: UserRole,
    /// Globally unique opaque id used to identify the user in private feeds.
    #[sea_orm(unique)]
    pub uuid: String,
    /// Reputation.
    pub score: i32,
    pub bronze_badges: i32,
    pub silver_badges: i32,
    pub gold_badges: i32,
    pub new_messages: i32,
    pub last_visited: DateTimeUtc,
    pub status: UserStatus,
    pub about_me: String,
    pub about_me_html: String,
    pub my_tags: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum UserRole {
    #[sea_orm(num_value = 0)]
    New,
    #[sea_orm(num_value = 1)]
    Moderator,
    #[sea_orm(num_value = 2)]
    Admin,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum UserStatus {
    #[sea_orm(num_value = 0)]
    Active,
    #[sea_orm(num_value = 1)]
    Suspended,
}

impl Model {
    pub fn is_moderator(&self) -> bool {
        self.role == UserRole::Moderator
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn can_moderate(&self) -> bool {
        self.is_moderator() || self.is_admin()
    }

    pub fn suspended(&self) -> bool {
        self.status == UserStatus::Suspended
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
