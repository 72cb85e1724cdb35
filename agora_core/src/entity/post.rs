use crate::ids::{PostId, UserId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A post is content generated by a user. Questions, blog entries and pages
/// are top-level: they are their own root and parent. Answers and comments
/// hang off a parent and share its root.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: PostId,
    pub author_id: UserId,
    pub lastedit_user_id: UserId,
    /// The underlying markdown.
    pub content: String,
    /// Sanitized HTML for display.
    pub html: String,
    pub title: String,
    pub slug: String,
    /// Canonical form of the post's tags, whitespace separated.
    pub tag_val: String,
    pub kind: PostKind,
    pub status: PostStatus,
    pub score: i32,
    /// Score aggregated over the whole thread; maintained on the root.
    pub full_score: i32,
    /// Relevance measure, seeded from the creation timestamp.
    pub rank: f64,
    pub views: i32,
    pub creation_date: DateTimeUtc,
    pub lastedit_date: DateTimeUtc,
    /// Top-level ancestor; top-level posts are their own root.
    pub root_id: PostId,
    /// Immediate parent; top-level posts are their own parent.
    pub parent_id: PostId,
    pub comment_count: i32,
    pub answer_count: i32,
    pub revision_count: i32,
    pub accepted: bool,
    /// External link, used only for blog posts.
    pub url: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum PostKind {
    #[sea_orm(num_value = 0)]
    Question,
    #[sea_orm(num_value = 1)]
    Answer,
    #[sea_orm(num_value = 2)]
    Comment,
    #[sea_orm(num_value = 3)]
    Blog,
    #[sea_orm(num_value = 4)]
    Page,
}

impl PostKind {
    pub fn is_top_level(self) -> bool {
        matches!(self, PostKind::Question | PostKind::Blog | PostKind::Page)
    }

    /// Content-only kinds carry no own title or tags.
    pub fn is_content_only(self) -> bool {
        matches!(self, PostKind::Answer | PostKind::Comment)
    }

    pub fn label(self) -> &'static str {
        match self {
            PostKind::Question => "Question",
            PostKind::Answer => "Answer",
            PostKind::Comment => "Comment",
            PostKind::Blog => "Blog",
            PostKind::Page => "Page",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum PostStatus {
    #[sea_orm(num_value = 0)]
    Open,
    #[sea_orm(num_value = 1)]
    Closed,
    #[sea_orm(num_value = 2)]
    Deleted,
}

impl Model {
    pub fn is_top_level(&self) -> bool {
        self.kind.is_top_level()
    }

    pub fn is_root(&self) -> bool {
        self.root_id == self.id
    }

    pub fn open(&self) -> bool {
        self.status == PostStatus::Open
    }

    pub fn closed(&self) -> bool {
        self.status == PostStatus::Closed
    }

    pub fn deleted(&self) -> bool {
        self.status == PostStatus::Deleted
    }

    /// Compact view combining all parts of a post, used as the diff basis
    /// between revisions.
    pub fn combine(&self) -> String {
        if self.kind.is_content_only() {
            self.content.clone()
        } else {
            format!("TITLE:{}\n{}\nTAGS:{}", self.title, self.content, self.tag_val)
        }
    }

    /// The post's tag values as a list of tag names.
    pub fn tag_names(&self) -> Vec<String> {
        crate::service::tags::parse_tag_names(&self.tag_val)
    }

    /// Site-relative location of the post inside its thread. Posts carrying
    /// an external link (blog entries) point there instead.
    pub fn url_in(&self, root: &Model) -> String {
        if !self.url.is_empty() {
            return self.url.clone();
        }
        if self.is_top_level() {
            format!("/post/{}/{}", root.id, root.slug)
        } else {
            format!("/post/{}/{}#{}", root.id, root.slug, self.id)
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
    #[sea_orm(belongs_to = "Entity", from = "Column::RootId", to = "Column::Id")]
    Root,
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
