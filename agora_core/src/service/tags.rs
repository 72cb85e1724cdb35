//! Tag existence and usage counts, kept in lockstep with post/tag
//! associations. Counts are derived state: +1 per association added, -1 per
//! association removed, captured before removal on clears.

use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::entity::prelude::*;
use crate::ids::{PostId, TagId};

#[derive(Debug, Error)]
pub enum TagsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("tag not found")]
    TagNotFound,
}

/// The post's tag values as a list of sanitized tag names: lowercased,
/// whitespace separated, stripped to slug-safe characters, deduplicated.
pub fn parse_tag_names(tag_val: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for raw in tag_val.split_whitespace() {
        let name: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '+' | '#'))
            .collect();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Rebuilds a post's tag associations from its canonical tag string.
/// Content-only posts carry no tags of their own.
pub(crate) async fn sync_tags<C: ConnectionTrait>(conn: &C, post: &PostModel) -> Result<(), DbErr> {
    if post.kind.is_content_only() {
        return Ok(());
    }

    clear_tags(conn, post.id).await?;

    for name in post.tag_names() {
        let tag = get_or_create(conn, &name).await?;
        PostTagActiveModel {
            post_id: Set(post.id),
            tag_id: Set(tag.id),
        }
        .insert(conn)
        .await?;
        bump_count(conn, tag.id, 1).await?;
    }

    Ok(())
}

/// Drops every association of a post, decrementing the counts of the tags
/// involved. The set is captured before removal since it is gone afterwards.
pub(crate) async fn clear_tags<C: ConnectionTrait>(conn: &C, post_id: PostId) -> Result<(), DbErr> {
    let current = PostTag::find()
        .filter(PostTagColumn::PostId.eq(post_id))
        .all(conn)
        .await?;

    for link in &current {
        bump_count(conn, link.tag_id, -1).await?;
    }

    PostTag::delete_many()
        .filter(PostTagColumn::PostId.eq(post_id))
        .exec(conn)
        .await?;

    Ok(())
}

/// New tag rows always start at count 0 regardless of any supplied value, so
/// bulk imports cannot double count.
pub(crate) async fn get_or_create<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<TagModel, DbErr> {
    if let Some(tag) = Tag::find()
        .filter(TagColumn::Name.eq(name))
        .one(conn)
        .await?
    {
        return Ok(tag);
    }

    TagActiveModel {
        id: Set(TagId::new()),
        name: Set(name.to_owned()),
        count: Set(0),
    }
    .insert(conn)
    .await
}

async fn bump_count<C: ConnectionTrait>(conn: &C, tag_id: TagId, delta: i32) -> Result<(), DbErr> {
    if let Some(tag) = Tag::find_by_id(tag_id).one(conn).await? {
        let mut tag_active: TagActiveModel = tag.clone().into();
        // never below zero, even under out-of-order deletes
        tag_active.count = Set((tag.count + delta).max(0));
        tag_active.update(conn).await?;
    }
    Ok(())
}

/// An include/exclude tag expression: names are included by default, a `-`
/// switches the following names to the exclusion set, a `+` switches back.
pub fn parse_tag_expr(text: &str) -> (Vec<String>, Vec<String>) {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    let mut excluding = false;

    let mut name = String::new();
    for c in text.chars() {
        match c {
            '+' | '-' | ' ' | '\t' | '\n' => {
                if !name.is_empty() {
                    let target = if excluding { &mut exclude } else { &mut include };
                    target.push(std::mem::take(&mut name));
                }
                if c == '-' {
                    excluding = true;
                } else if c == '+' {
                    excluding = false;
                }
            }
            _ => name.push(c.to_ascii_lowercase()),
        }
    }
    if !name.is_empty() {
        let target = if excluding { &mut exclude } else { &mut include };
        target.push(name);
    }

    (include, exclude)
}

#[derive(Clone)]
pub struct TagsService {
    db: DatabaseConnection,
}

impl TagsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_tag(&self, name: &str) -> Result<TagModel, TagsServiceError> {
        Tag::find()
            .filter(TagColumn::Name.eq(name))
            .one(&self.db)
            .await?
            .ok_or(TagsServiceError::TagNotFound)
    }

    pub async fn list_tags(&self) -> Result<Vec<TagModel>, TagsServiceError> {
        let tags = Tag::find()
            .order_by_desc(TagColumn::Count)
            .all(&self.db)
            .await?;
        Ok(tags)
    }

    /// Top-level posts matching a `+`/`-` tag expression, rank descending.
    /// Deleted posts are never returned here.
    pub async fn query_by_tags(&self, expr: &str) -> Result<Vec<PostModel>, TagsServiceError> {
        let (include, exclude) = parse_tag_expr(expr);

        let include_posts = self.post_ids_tagged(&include).await?;
        let exclude_posts = self.post_ids_tagged(&exclude).await?;

        let mut query = Post::find()
            .filter(PostColumn::Kind.is_in([PostKind::Question, PostKind::Blog, PostKind::Page]))
            .filter(PostColumn::Status.ne(PostStatus::Deleted));
        if !include.is_empty() {
            query = query.filter(PostColumn::Id.is_in(include_posts));
        }
        if !exclude_posts.is_empty() {
            query = query.filter(PostColumn::Id.is_not_in(exclude_posts));
        }

        let posts = query.order_by_desc(PostColumn::Rank).all(&self.db).await?;
        Ok(posts)
    }

    /// Posts matching the tags a profile subscribed to in `my_tags`.
    pub async fn query_by_my_tags(
        &self,
        profile: &ProfileModel,
    ) -> Result<Vec<PostModel>, TagsServiceError> {
        self.query_by_tags(&profile.my_tags).await
    }

    async fn post_ids_tagged(&self, names: &[String]) -> Result<Vec<PostId>, TagsServiceError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let tag_ids: Vec<TagId> = Tag::find()
            .filter(TagColumn::Name.is_in(names.iter().map(String::as_str)))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let post_ids = PostTag::find()
            .filter(PostTagColumn::TagId.is_in(tag_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|link| link.post_id)
            .collect();
        Ok(post_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::post::PostStatus;
    use crate::service::posts::{EditPost, NewPost};
    use crate::test_utils::{create_test_user, setup_test_db, test_services, TestServices};
    use crate::ids::UserId;

    #[test]
    fn test_parse_tag_names() {
        let names = parse_tag_names("Rust  sea-orm rust <script>");
        assert_eq!(names, vec!["rust", "sea-orm", "script"]);
    }

    #[test]
    fn test_parse_tag_expr() {
        let (include, exclude) = parse_tag_expr("rust+async-windows-macos+tokio");
        assert_eq!(include, vec!["rust", "async", "tokio"]);
        assert_eq!(exclude, vec!["windows", "macos"]);
    }

    #[test]
    fn test_parse_tag_expr_empty() {
        let (include, exclude) = parse_tag_expr("");
        assert!(include.is_empty());
        assert!(exclude.is_empty());
    }

    async fn tagged_question(svc: &TestServices, author: UserId, title: &str, tag_val: &str) -> crate::entity::prelude::PostModel {
        svc.posts
            .create_post(NewPost {
                author,
                kind: crate::entity::post::PostKind::Question,
                title: title.to_owned(),
                content: "Tagged body.".to_owned(),
                tag_val: tag_val.to_owned(),
                parent: None,
                url: String::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_tag_counts_follow_associations() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "tagger").await;

        tagged_question(&svc, user.id, "First", "rust async").await;
        let second = tagged_question(&svc, user.id, "Second", "rust").await;

        assert_eq!(svc.tags.get_tag("rust").await.unwrap().count, 2);
        assert_eq!(svc.tags.get_tag("async").await.unwrap().count, 1);

        // retagging moves the counts with the associations
        svc.posts
            .edit_post(
                user.id,
                second.id,
                EditPost {
                    tag_val: Some("tokio".to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(svc.tags.get_tag("rust").await.unwrap().count, 1);
        assert_eq!(svc.tags.get_tag("tokio").await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_hard_delete_releases_tag_counts() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "tagger").await;

        let question = tagged_question(&svc, user.id, "Gone soon", "rust").await;
        assert_eq!(svc.tags.get_tag("rust").await.unwrap().count, 1);

        svc.moderation
            .moderate_post(user.id, question.id, PostStatus::Deleted)
            .await
            .unwrap();

        // count never goes negative, it returns to zero exactly
        assert_eq!(svc.tags.get_tag("rust").await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_resync_is_idempotent_for_counts() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "tagger").await;

        let question = tagged_question(&svc, user.id, "Stable", "rust").await;
        // an edit that keeps the same tags must not inflate the count
        svc.posts
            .edit_post(
                user.id,
                question.id,
                EditPost {
                    tag_val: Some("rust".to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(svc.tags.get_tag("rust").await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_query_by_tags_include_exclude() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "tagger").await;

        let keep = tagged_question(&svc, user.id, "Keep", "rust async").await;
        tagged_question(&svc, user.id, "Skip", "rust windows").await;

        let posts = svc.tags.query_by_tags("rust-windows").await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_query_by_my_tags() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "subscriber").await;

        tagged_question(&svc, user.id, "Interesting", "tokio").await;
        tagged_question(&svc, user.id, "Other", "gamedev").await;

        let profile = svc.users.set_my_tags(user.id, "tokio").await.unwrap();
        let posts = svc.tags.query_by_my_tags(&profile).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Interesting");
    }
}
