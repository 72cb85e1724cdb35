use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{DatabaseConnection, TransactionTrait};
use thiserror::Error;

use super::propagate::{self, Change, Direction};
use super::{notes, revisions, tags};
use crate::collab::{Authorizer, Markup, SearchIndex};
use crate::entity::prelude::*;
use crate::ids::{PostId, UserId};

pub const MAX_CONTENT_LEN: usize = 10_000;
pub const MAX_TITLE_LEN: usize = 200;

/// Rank seconds gained by a post on each counted view.
const VIEW_RANK_GAIN: f64 = 3600.0;

#[derive(Debug, Error)]
pub enum PostsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("post not found")]
    PostNotFound,

    #[error("parent post not found")]
    ParentNotFound,

    #[error("profile not found")]
    ProfileNotFound,

    #[error("posts of this kind must have a parent")]
    MissingParent,

    #[error("top-level posts must have a title")]
    MissingTitle,

    #[error("content exceeds {MAX_CONTENT_LEN} characters")]
    ContentTooLong,

    #[error("title exceeds {MAX_TITLE_LEN} characters")]
    TitleTooLong,

    #[error("unauthorized: may not edit this post")]
    Unauthorized,
}

pub struct NewPost {
    pub author: UserId,
    pub kind: PostKind,
    pub title: String,
    pub content: String,
    pub tag_val: String,
    /// Required for answers and comments, ignored for top-level kinds.
    pub parent: Option<PostId>,
    /// External link, used by blog posts.
    pub url: String,
}

#[derive(Default)]
pub struct EditPost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tag_val: Option<String>,
}

#[derive(Clone)]
pub struct PostsService {
    db: DatabaseConnection,
    markup: Arc<dyn Markup>,
    authorizer: Arc<dyn Authorizer>,
    search: Arc<dyn SearchIndex>,
    content_indexing: bool,
    hours_per_vote: u32,
}

impl PostsService {
    pub fn new(
        db: DatabaseConnection,
        markup: Arc<dyn Markup>,
        authorizer: Arc<dyn Authorizer>,
        search: Arc<dyn SearchIndex>,
        content_indexing: bool,
        hours_per_vote: u32,
    ) -> Self {
        Self {
            db,
            markup,
            authorizer,
            search,
            content_indexing,
            hours_per_vote,
        }
    }

    /// Creates a post and fans out every creation side effect in one
    /// transaction: parent counters, tag index, creation notices and the
    /// baseline revision.
    pub async fn create_post(&self, new: NewPost) -> Result<PostModel, PostsServiceError> {
        let content = new.content.trim().to_owned();
        if content.chars().count() > MAX_CONTENT_LEN {
            return Err(PostsServiceError::ContentTooLong);
        }

        let txn = self.db.begin().await?;

        let id = PostId::new();
        let now = Utc::now();

        // Non-top-level posts must be constructed with a parent; the root is
        // the parent's root, so root chains collapse to one hop.
        let (root_id, parent_id, title, tag_val) = if new.kind.is_top_level() {
            let title = new.title.trim().to_owned();
            if title.is_empty() {
                return Err(PostsServiceError::MissingTitle);
            }
            if title.chars().count() > MAX_TITLE_LEN {
                return Err(PostsServiceError::TitleTooLong);
            }
            (id, id, title, new.tag_val.clone())
        } else {
            let parent_id = new.parent.ok_or(PostsServiceError::MissingParent)?;
            let parent = Post::find_by_id(parent_id)
                .one(&txn)
                .await?
                .ok_or(PostsServiceError::ParentNotFound)?;
            let title = if new.title.trim().is_empty() {
                derived_title(new.kind, &parent.title)
            } else {
                new.title.trim().to_owned()
            };
            (parent.root_id, parent.id, title, String::new())
        };

        let post = PostActiveModel {
            id: Set(id),
            author_id: Set(new.author),
            lastedit_user_id: Set(new.author),
            html: Set(self.markup.render(&content)),
            content: Set(content),
            slug: Set(slugify(&title)),
            title: Set(title),
            tag_val: Set(tag_val),
            kind: Set(new.kind),
            status: Set(PostStatus::Open),
            score: Set(0),
            full_score: Set(0),
            rank: Set(now.timestamp() as f64),
            views: Set(0),
            creation_date: Set(now),
            lastedit_date: Set(now),
            root_id: Set(root_id),
            parent_id: Set(parent_id),
            comment_count: Set(0),
            answer_count: Set(0),
            revision_count: Set(0),
            accepted: Set(false),
            url: Set(new.url),
        }
        .insert(&txn)
        .await?;

        propagate::apply(&txn, Change::Post(&post), Direction::Apply, self.hours_per_vote)
            .await?;
        tags::sync_tags(&txn, &post).await?;

        // Creation is only notable once content exists; a bare shell saved
        // ahead of its content gets no notices and no baseline revision.
        if !post.content.is_empty() {
            notes::post_create_notification(&txn, self.markup.as_ref(), &post).await?;
            revisions::create_revision(&txn, &post, post.author_id).await?;
        }

        txn.commit().await?;
        tracing::info!(post = %post.id, author = %post.author_id, kind = post.kind.label(), "post created");

        if self.content_indexing {
            self.search.update(&post, true);
        }

        self.get_post(post.id).await
    }

    /// Edits a post on behalf of `editor`, re-rendering content, resyncing
    /// tags and recording a revision when the combined form changed.
    pub async fn edit_post(
        &self,
        editor: UserId,
        post_id: PostId,
        edit: EditPost,
    ) -> Result<PostModel, PostsServiceError> {
        let txn = self.db.begin().await?;

        let post = Post::find_by_id(post_id)
            .one(&txn)
            .await?
            .ok_or(PostsServiceError::PostNotFound)?;
        let editor_profile = Profile::find()
            .filter(ProfileColumn::UserId.eq(editor))
            .one(&txn)
            .await?
            .ok_or(PostsServiceError::ProfileNotFound)?;

        if !self
            .authorizer
            .authorize_post_edit(&editor_profile, &post, false)
        {
            tracing::warn!(editor = %editor, post = %post.id, "edit rejected");
            return Err(PostsServiceError::Unauthorized);
        }

        let mut post_active: PostActiveModel = post.clone().into();
        if let Some(title) = edit.title {
            let title = title.trim().to_owned();
            if title.is_empty() {
                return Err(PostsServiceError::MissingTitle);
            }
            if title.chars().count() > MAX_TITLE_LEN {
                return Err(PostsServiceError::TitleTooLong);
            }
            post_active.slug = Set(slugify(&title));
            post_active.title = Set(title);
        }
        if let Some(content) = edit.content {
            let content = content.trim().to_owned();
            if content.chars().count() > MAX_CONTENT_LEN {
                return Err(PostsServiceError::ContentTooLong);
            }
            post_active.html = Set(self.markup.render(&content));
            post_active.content = Set(content);
        }
        if let Some(tag_val) = edit.tag_val {
            post_active.tag_val = Set(tag_val);
        }
        post_active.lastedit_user_id = Set(editor);
        post_active.lastedit_date = Set(Utc::now());

        let post = post_active.update(&txn).await?;
        tags::sync_tags(&txn, &post).await?;
        revisions::create_revision(&txn, &post, editor).await?;
        txn.commit().await?;

        if self.content_indexing {
            self.search.update(&post, false);
        }

        self.get_post(post.id).await
    }

    pub async fn get_post(&self, post_id: PostId) -> Result<PostModel, PostsServiceError> {
        Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(PostsServiceError::PostNotFound)
    }

    /// Every post of a thread, root first, then by creation date.
    pub async fn thread(&self, root_id: PostId) -> Result<Vec<PostModel>, PostsServiceError> {
        let posts = Post::find()
            .filter(PostColumn::RootId.eq(root_id))
            .order_by_asc(PostColumn::CreationDate)
            .all(&self.db)
            .await?;
        Ok(posts)
    }

    pub async fn comments(&self, post_id: PostId) -> Result<Vec<PostModel>, PostsServiceError> {
        let posts = Post::find()
            .filter(PostColumn::ParentId.eq(post_id))
            .filter(PostColumn::Kind.eq(PostKind::Comment))
            .order_by_asc(PostColumn::CreationDate)
            .all(&self.db)
            .await?;
        Ok(posts)
    }

    /// Top-level posts by rank. Deleted posts are only visible to moderators.
    pub async fn list_top_level(
        &self,
        viewer_can_moderate: bool,
    ) -> Result<Vec<PostModel>, PostsServiceError> {
        let mut query = Post::find().filter(PostColumn::Kind.is_in([
            PostKind::Question,
            PostKind::Blog,
            PostKind::Page,
        ]));
        if !viewer_can_moderate {
            query = query.filter(PostColumn::Status.ne(PostStatus::Deleted));
        }
        let posts = query.order_by_desc(PostColumn::Rank).all(&self.db).await?;
        Ok(posts)
    }

    pub async fn revisions(
        &self,
        post_id: PostId,
    ) -> Result<Vec<PostRevisionModel>, PostsServiceError> {
        Ok(revisions::list_revisions(&self.db, post_id).await?)
    }

    /// Counts a view once per session. The session's already-viewed set comes
    /// from the external identity store; the update itself is a direct atomic
    /// increment that bypasses the propagator by design (best-effort counter,
    /// see DESIGN.md).
    pub async fn register_view(
        &self,
        post_id: PostId,
        viewed: &mut HashSet<PostId>,
    ) -> Result<bool, PostsServiceError> {
        if viewed.contains(&post_id) {
            return Ok(false);
        }

        Post::update_many()
            .col_expr(PostColumn::Views, Expr::col(PostColumn::Views).add(1))
            .col_expr(PostColumn::Rank, Expr::col(PostColumn::Rank).add(VIEW_RANK_GAIN))
            .filter(PostColumn::Id.eq(post_id))
            .exec(&self.db)
            .await?;

        viewed.insert(post_id);
        Ok(true)
    }
}

fn derived_title(kind: PostKind, parent_title: &str) -> String {
    let title = format!("{}: {}", &kind.label()[..1], parent_title);
    title.chars().take(MAX_TITLE_LEN).collect()
}

/// Lowercased, dash-separated form of a title, used in post urls.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        answer_to, comment_on, create_test_user, question_by, setup_test_db, test_services,
    };

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("How do Lifetimes work?"), "how-do-lifetimes-work");
        assert_eq!(slugify("  weird -- punctuation!! "), "weird-punctuation");
        assert_eq!(slugify(""), "");
    }

    #[tokio::test]
    async fn test_question_is_its_own_root_and_parent() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "asker").await;

        let question = question_by(&svc, user.id, "What is ownership?").await;

        assert_eq!(question.root_id, question.id);
        assert_eq!(question.parent_id, question.id);
        assert_eq!(question.slug, "what-is-ownership");
        // creation stored the baseline revision
        assert_eq!(question.revision_count, 1);
    }

    #[tokio::test]
    async fn test_answer_requires_parent() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "answerer").await;

        let result = svc
            .posts
            .create_post(NewPost {
                author: user.id,
                kind: PostKind::Answer,
                title: String::new(),
                content: "An orphan answer".into(),
                tag_val: String::new(),
                parent: None,
                url: String::new(),
            })
            .await;

        assert!(matches!(result, Err(PostsServiceError::MissingParent)));
    }

    #[tokio::test]
    async fn test_root_collapses_to_one_hop() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (asker, _) = create_test_user(&db, "asker").await;
        let (answerer, _) = create_test_user(&db, "answerer").await;
        let (commenter, _) = create_test_user(&db, "commenter").await;

        let question = question_by(&svc, asker.id, "Root hop").await;
        let answer = answer_to(&svc, answerer.id, question.id).await;
        let comment = comment_on(&svc, commenter.id, answer.id).await;

        assert_eq!(answer.root_id, question.id);
        assert_eq!(comment.root_id, question.id);
        assert_eq!(comment.parent_id, answer.id);

        // root of a post's root equals that root
        let root = svc.posts.get_post(comment.root_id).await.unwrap();
        assert_eq!(root.root_id, root.id);
    }

    #[tokio::test]
    async fn test_answer_and_comment_counters() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (asker, _) = create_test_user(&db, "asker").await;
        let (other, _) = create_test_user(&db, "other").await;

        let question = question_by(&svc, asker.id, "Counted").await;
        let answer = answer_to(&svc, other.id, question.id).await;
        comment_on(&svc, asker.id, answer.id).await;
        comment_on(&svc, other.id, answer.id).await;

        let question = svc.posts.get_post(question.id).await.unwrap();
        let answer = svc.posts.get_post(answer.id).await.unwrap();
        assert_eq!(question.answer_count, 1);
        assert_eq!(answer.comment_count, 2);
    }

    #[tokio::test]
    async fn test_content_only_post_gets_derived_title() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (asker, _) = create_test_user(&db, "asker").await;
        let (answerer, _) = create_test_user(&db, "answerer").await;

        let question = question_by(&svc, asker.id, "Titled question").await;
        let answer = answer_to(&svc, answerer.id, question.id).await;

        assert_eq!(answer.title, "A: Titled question");
        assert!(answer.tag_val.is_empty());
    }

    #[tokio::test]
    async fn test_empty_content_creation_has_no_side_effects() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "asker").await;

        let question = svc
            .posts
            .create_post(NewPost {
                author: user.id,
                kind: PostKind::Question,
                title: "Shell first".into(),
                content: String::new(),
                tag_val: String::new(),
                parent: None,
                url: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(question.revision_count, 0);
        assert!(svc.posts.revisions(question.id).await.unwrap().is_empty());
        // no creation notices either
        assert!(svc.notes.list_for(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_records_revision_and_noop_edit_does_not() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "author").await;
        let question = question_by(&svc, user.id, "Revise me").await;
        assert_eq!(question.revision_count, 1);

        // a save that changes nothing is skipped silently
        let unchanged = svc
            .posts
            .edit_post(user.id, question.id, EditPost::default())
            .await
            .unwrap();
        assert_eq!(unchanged.revision_count, 1);

        let edited = svc
            .posts
            .edit_post(
                user.id,
                question.id,
                EditPost {
                    content: Some("Sharper wording.".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.revision_count, 2);

        let revisions = svc.posts.revisions(question.id).await.unwrap();
        assert_eq!(revisions.len(), 2);
        // the newest diff rebuilds the previous combined form
        let prior = crate::service::revisions::diff_prior(&revisions[1].diff);
        assert_eq!(prior, revisions[0].content);
    }

    #[tokio::test]
    async fn test_comment_edits_never_version() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (asker, _) = create_test_user(&db, "asker").await;
        let (commenter, _) = create_test_user(&db, "commenter").await;
        let question = question_by(&svc, asker.id, "Quiet comments").await;
        let comment = comment_on(&svc, commenter.id, question.id).await;
        assert_eq!(comment.revision_count, 0);

        let edited = svc
            .posts
            .edit_post(
                commenter.id,
                comment.id,
                EditPost {
                    content: Some("Edited comment body".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.revision_count, 0);
        assert!(svc.posts.revisions(comment.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_by_stranger_is_rejected() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (author, _) = create_test_user(&db, "author").await;
        let (stranger, _) = create_test_user(&db, "stranger").await;
        let question = question_by(&svc, author.id, "Mine").await;

        let result = svc
            .posts
            .edit_post(
                stranger.id,
                question.id,
                EditPost {
                    content: Some("hijacked".into()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(PostsServiceError::Unauthorized)));
        let post = svc.posts.get_post(question.id).await.unwrap();
        assert_eq!(post.content, "A body long enough to matter.");
    }

    #[tokio::test]
    async fn test_register_view_deduplicates_per_session() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "viewer").await;
        let question = question_by(&svc, user.id, "Viewed").await;

        let mut session = HashSet::new();
        assert!(svc
            .posts
            .register_view(question.id, &mut session)
            .await
            .unwrap());
        assert!(!svc
            .posts
            .register_view(question.id, &mut session)
            .await
            .unwrap());

        let post = svc.posts.get_post(question.id).await.unwrap();
        assert_eq!(post.views, 1);

        // a different session counts again
        let mut other_session = HashSet::new();
        svc.posts
            .register_view(question.id, &mut other_session)
            .await
            .unwrap();
        assert_eq!(svc.posts.get_post(question.id).await.unwrap().views, 2);
    }

    #[tokio::test]
    async fn test_thread_and_listing_queries() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (asker, _) = create_test_user(&db, "asker").await;
        let (other, _) = create_test_user(&db, "other").await;

        let question = question_by(&svc, asker.id, "Threaded").await;
        let answer = answer_to(&svc, other.id, question.id).await;
        let comment = comment_on(&svc, asker.id, answer.id).await;

        let thread = svc.posts.thread(question.id).await.unwrap();
        assert_eq!(thread.len(), 3);
        assert_eq!(thread[0].id, question.id);

        let comments = svc.posts.comments(answer.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, comment.id);

        // only the question is top-level
        let listed = svc.posts.list_top_level(false).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, question.id);
    }

    #[tokio::test]
    async fn test_soft_deleted_posts_hidden_from_non_moderators() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (asker, _) = create_test_user(&db, "asker").await;
        let (other, _) = create_test_user(&db, "other").await;

        let question = question_by(&svc, asker.id, "Hidden later").await;
        answer_to(&svc, other.id, question.id).await;
        svc.moderation
            .moderate_post(asker.id, question.id, PostStatus::Deleted)
            .await
            .unwrap();

        assert!(svc.posts.list_top_level(false).await.unwrap().is_empty());
        assert_eq!(svc.posts.list_top_level(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_answer_notifies_thread_authors() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (a, _) = create_test_user(&db, "a").await;
        let (b, _) = create_test_user(&db, "b").await;

        let question = question_by(&svc, a.id, "Notify me").await;
        // the author's own creation notice is pre-read
        let a_notes = svc.notes.list_for(a.id).await.unwrap();
        assert_eq!(a_notes.len(), 1);
        assert!(!a_notes[0].unread);

        answer_to(&svc, b.id, question.id).await;

        let a_notes = svc.notes.list_for(a.id).await.unwrap();
        assert_eq!(a_notes.len(), 2);
        assert!(a_notes.iter().any(|n| n.unread));
        assert_eq!(svc.users.get_profile(a.id).await.unwrap().new_messages, 1);

        // the answerer's own copy is read
        let b_notes = svc.notes.list_for(b.id).await.unwrap();
        assert_eq!(b_notes.len(), 1);
        assert!(!b_notes[0].unread);
        assert_eq!(svc.users.get_profile(b.id).await.unwrap().new_messages, 0);
    }
}
