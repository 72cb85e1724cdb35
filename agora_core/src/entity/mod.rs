// SeaORM entities
// One module per table; the prelude re-exports aliased entity types the way
// the service layer consumes them.

pub mod award;
pub mod badge;
pub mod note;
pub mod post;
pub mod post_revision;
pub mod post_tag;
pub mod profile;
pub mod tag;
pub mod user;
pub mod vote;


pub mod prelude {
    // Re-export all entities for convenience
    pub use super::award::{
        ActiveModel as AwardActiveModel, Column as AwardColumn, Entity as Award,
        Model as AwardModel,
    };
    pub use super::badge::{
        ActiveModel as BadgeActiveModel, BadgeTier, Column as BadgeColumn, Entity as Badge,
        Model as BadgeModel,
    };
    pub use super::note::{
        ActiveModel as NoteActiveModel, Column as NoteColumn, Entity as Note, Model as NoteModel,
        NoteKind,
    };
    pub use super::post::{
        ActiveModel as PostActiveModel, Column as PostColumn, Entity as Post, Model as PostModel,
        PostKind, PostStatus,
    };
    pub use super::post_revision::{
        ActiveModel as PostRevisionActiveModel, Column as PostRevisionColumn,
        Entity as PostRevision, Model as PostRevisionModel,
    };
    pub use super::post_tag::{
        ActiveModel as PostTagActiveModel, Column as PostTagColumn, Entity as PostTag,
        Model as PostTagModel,
    };
    pub use super::profile::{
        ActiveModel as ProfileActiveModel, Column as ProfileColumn, Entity as Profile,
        Model as ProfileModel, UserRole, UserStatus,
    };
    pub use super::tag::{
        ActiveModel as TagActiveModel, Column as TagColumn, Entity as Tag, Model as TagModel,
    };
    pub use super::user::{
        ActiveModel as UserActiveModel, Column as UserColumn, Entity as User, Model as UserModel,
    };
    pub use super::vote::{
        ActiveModel as VoteActiveModel, Column as VoteColumn, Entity as Vote, Model as VoteModel,
        VoteKind,
    };

    // Re-export commonly used SeaORM types and traits
    pub use sea_orm::{
        ActiveModelTrait,
        ActiveValue,

        ColumnTrait,
        ConnectionTrait,

        // Database and connection types
        Database,
        DatabaseConnection,
        DbConn,
        // Common result types
        DbErr,

        // Core traits
        EntityTrait,
        ModelTrait,
        NotSet,
        // Pagination
        PaginatorTrait,
        QueryFilter,
        QueryOrder,
        QuerySelect,
        Related,
        RelationTrait,
        // Active model helpers
        Set,
        TransactionTrait,

        Unchanged,
    };
}
