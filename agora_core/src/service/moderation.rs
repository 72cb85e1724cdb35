//! Status transitions on posts and users. Authorization failures are data,
//! not errors: they come back as [`ModerationOutcome::Denied`] with a
//! human-readable reason and no mutation, for the calling layer to render.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use thiserror::Error;

use super::propagate::{self, Change, Direction};
use super::{notes, tags};
use crate::collab::{Authorizer, Markup};
use crate::entity::prelude::*;
use crate::ids::{PostId, UserId};

#[derive(Debug, Error)]
pub enum ModerationServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("post not found")]
    PostNotFound,

    #[error("profile not found")]
    ProfileNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    Applied { message: String },
    Denied { reason: String },
}

impl ModerationOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, ModerationOutcome::Applied { .. })
    }
}

#[derive(Clone)]
pub struct ModerationService {
    db: DatabaseConnection,
    authorizer: Arc<dyn Authorizer>,
    markup: Arc<dyn Markup>,
    hours_per_vote: u32,
}

impl ModerationService {
    pub fn new(
        db: DatabaseConnection,
        authorizer: Arc<dyn Authorizer>,
        markup: Arc<dyn Markup>,
        hours_per_vote: u32,
    ) -> Self {
        Self {
            db,
            authorizer,
            markup,
            hours_per_vote,
        }
    }

    /// Performs a moderator action on a post.
    pub async fn moderate_post(
        &self,
        actor: UserId,
        post_id: PostId,
        new_status: PostStatus,
    ) -> Result<ModerationOutcome, ModerationServiceError> {
        let actor_profile = self.profile_of(actor).await?;
        let post = Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(ModerationServiceError::PostNotFound)?;

        // setting posts back to open requires more than ownership
        if new_status == PostStatus::Open && !actor_profile.can_moderate() {
            let reason = format!("user {actor} is not a moderator");
            tracing::warn!(%actor, post = %post_id, "{reason}");
            return Ok(ModerationOutcome::Denied { reason });
        }

        if !self.authorizer.authorize_post_edit(&actor_profile, &post, false) {
            let reason = format!("user {actor} may not moderate post {post_id}");
            tracing::warn!(%actor, post = %post_id, "{reason}");
            return Ok(ModerationOutcome::Denied { reason });
        }

        let child_count = Post::find()
            .filter(PostColumn::ParentId.eq(post.id))
            .filter(PostColumn::Id.ne(post.id))
            .count(&self.db)
            .await?;

        // Authors may remove their own posts without a trace as long as
        // nothing would be orphaned: votes and the post go, no tombstone,
        // no note.
        if new_status == PostStatus::Deleted && child_count == 0 && actor == post.author_id {
            let txn = self.db.begin().await?;

            tags::clear_tags(&txn, post.id).await?;

            let votes = Vote::find()
                .filter(VoteColumn::PostId.eq(post.id))
                .all(&txn)
                .await?;
            for vote in &votes {
                propagate::apply(&txn, Change::Vote(vote), Direction::Undo, self.hours_per_vote)
                    .await?;
                Vote::delete_by_id(vote.id).exec(&txn).await?;
            }

            propagate::apply(&txn, Change::Post(&post), Direction::Undo, self.hours_per_vote)
                .await?;
            Post::delete_by_id(post.id).exec(&txn).await?;

            txn.commit().await?;
            tracing::info!(%actor, post = %post_id, "post hard-deleted by author");
            return Ok(ModerationOutcome::Applied {
                message: "post removed".to_owned(),
            });
        }

        let txn = self.db.begin().await?;

        let mut post_active: PostActiveModel = post.clone().into();
        post_active.status = Set(new_status);
        let post = post_active.update(&txn).await?;

        let root = Post::find_by_id(post.root_id)
            .one(&txn)
            .await?
            .ok_or(ModerationServiceError::PostNotFound)?;
        let text = notes::post_moderator_text(&actor_profile, &post);
        notes::send_note(
            &txn,
            self.markup.as_ref(),
            notes::SendNote {
                sender: actor,
                target: post.author_id,
                content: &text,
                kind: NoteKind::Moderator,
                unread: true,
                url: &post.url_in(&root),
                both: actor != post.author_id,
                date: Utc::now(),
            },
        )
        .await?;

        txn.commit().await?;
        tracing::info!(%actor, post = %post_id, status = ?new_status, "post moderated");
        Ok(ModerationOutcome::Applied {
            message: format!("post status set to {new_status:?}"),
        })
    }

    /// Performs a moderator action on a user.
    pub async fn moderate_user(
        &self,
        actor: UserId,
        target: UserId,
        new_status: UserStatus,
    ) -> Result<ModerationOutcome, ModerationServiceError> {
        let actor_profile = self.profile_of(actor).await?;
        let target_profile = self.profile_of(target).await?;

        if !actor_profile.can_moderate() {
            let reason = format!("user {actor} is not a moderator");
            tracing::warn!(%actor, %target, "{reason}");
            return Ok(ModerationOutcome::Denied { reason });
        }

        if !self
            .authorizer
            .authorize_user_edit(&actor_profile, &target_profile, false)
        {
            let reason = format!("user {actor} is not authorized to moderate {target}");
            tracing::warn!(%actor, %target, "{reason}");
            return Ok(ModerationOutcome::Denied { reason });
        }

        let txn = self.db.begin().await?;

        let mut profile_active: ProfileActiveModel = target_profile.clone().into();
        profile_active.status = Set(new_status);
        let updated = profile_active.update(&txn).await?;

        let text = notes::user_moderator_text(&actor_profile, &updated);
        notes::send_note(
            &txn,
            self.markup.as_ref(),
            notes::SendNote {
                sender: actor,
                target,
                content: &text,
                kind: NoteKind::Moderator,
                unread: true,
                url: &format!("/user/{target}"),
                both: actor != target,
                date: Utc::now(),
            },
        )
        .await?;

        txn.commit().await?;
        tracing::info!(%actor, %target, status = ?new_status, "user moderated");
        Ok(ModerationOutcome::Applied {
            message: format!("user status set to {new_status:?}"),
        })
    }

    async fn profile_of(&self, user: UserId) -> Result<ProfileModel, ModerationServiceError> {
        Profile::find()
            .filter(ProfileColumn::UserId.eq(user))
            .one(&self.db)
            .await?
            .ok_or(ModerationServiceError::ProfileNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::prelude::VoteKind;
    use crate::test_utils::{
        answer_to, create_test_moderator, create_test_user, question_by, setup_test_db,
        test_services,
    };

    #[tokio::test]
    async fn test_reopen_requires_moderator() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (author, _) = create_test_user(&db, "author").await;
        let (moderator, _) = create_test_moderator(&db, "moderator").await;
        let question = question_by(&svc, author.id, "Closable").await;

        let closed = svc
            .moderation
            .moderate_post(moderator.id, question.id, PostStatus::Closed)
            .await
            .unwrap();
        assert!(closed.applied());

        // the author alone may not reopen
        let denied = svc
            .moderation
            .moderate_post(author.id, question.id, PostStatus::Open)
            .await
            .unwrap();
        assert!(!denied.applied());
        assert!(svc.posts.get_post(question.id).await.unwrap().closed());

        let reopened = svc
            .moderation
            .moderate_post(moderator.id, question.id, PostStatus::Open)
            .await
            .unwrap();
        assert!(reopened.applied());
        assert!(svc.posts.get_post(question.id).await.unwrap().open());
    }

    #[tokio::test]
    async fn test_unauthorized_moderation_is_denied_without_mutation() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (author, _) = create_test_user(&db, "author").await;
        let (stranger, _) = create_test_user(&db, "stranger").await;
        let question = question_by(&svc, author.id, "Untouchable").await;

        let outcome = svc
            .moderation
            .moderate_post(stranger.id, question.id, PostStatus::Closed)
            .await
            .unwrap();

        assert!(!outcome.applied());
        assert!(svc.posts.get_post(question.id).await.unwrap().open());
    }

    #[tokio::test]
    async fn test_author_hard_delete_removes_votes_and_post_without_note() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (author, _) = create_test_user(&db, "author").await;
        let (voter, _) = create_test_user(&db, "voter").await;
        let question = question_by(&svc, author.id, "Ephemeral").await;
        svc.votes
            .cast(voter.id, question.id, VoteKind::Up)
            .await
            .unwrap();
        assert_eq!(svc.users.get_profile(author.id).await.unwrap().score, 1);
        let notes_before = svc.notes.list_for(author.id).await.unwrap().len();

        let outcome = svc
            .moderation
            .moderate_post(author.id, question.id, PostStatus::Deleted)
            .await
            .unwrap();
        assert!(outcome.applied());

        // the post and its votes are gone, reputation reversed, no new note
        assert!(svc.posts.get_post(question.id).await.is_err());
        assert!(svc.votes.votes_by(voter.id).await.unwrap().is_empty());
        assert_eq!(svc.users.get_profile(author.id).await.unwrap().score, 0);
        assert_eq!(
            svc.notes.list_for(author.id).await.unwrap().len(),
            notes_before
        );
    }

    #[tokio::test]
    async fn test_author_delete_with_children_is_a_soft_delete() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (author, _) = create_test_user(&db, "author").await;
        let (answerer, _) = create_test_user(&db, "answerer").await;
        let question = question_by(&svc, author.id, "Answered already").await;
        answer_to(&svc, answerer.id, question.id).await;

        let outcome = svc
            .moderation
            .moderate_post(author.id, question.id, PostStatus::Deleted)
            .await
            .unwrap();
        assert!(outcome.applied());

        // children keep the post row alive as a tombstone
        let post = svc.posts.get_post(question.id).await.unwrap();
        assert!(post.deleted());
    }

    #[tokio::test]
    async fn test_moderator_action_notifies_author_and_actor() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (author, _) = create_test_user(&db, "author").await;
        let (moderator, _) = create_test_moderator(&db, "moderator").await;
        let question = question_by(&svc, author.id, "Noted").await;

        svc.moderation
            .moderate_post(moderator.id, question.id, PostStatus::Closed)
            .await
            .unwrap();

        let author_notes = svc.notes.list_for(author.id).await.unwrap();
        assert!(author_notes
            .iter()
            .any(|n| n.kind == NoteKind::Moderator && n.unread));

        // the actor keeps an always-read copy
        let actor_notes = svc.notes.list_for(moderator.id).await.unwrap();
        assert!(actor_notes
            .iter()
            .any(|n| n.kind == NoteKind::Moderator && !n.unread));
    }

    #[tokio::test]
    async fn test_moderate_user_suspends_and_notifies() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (target, _) = create_test_user(&db, "target").await;
        let (moderator, _) = create_test_moderator(&db, "moderator").await;

        let denied = svc
            .moderation
            .moderate_user(target.id, moderator.id, UserStatus::Suspended)
            .await
            .unwrap();
        assert!(!denied.applied());

        let outcome = svc
            .moderation
            .moderate_user(moderator.id, target.id, UserStatus::Suspended)
            .await
            .unwrap();
        assert!(outcome.applied());

        let profile = svc.users.get_profile(target.id).await.unwrap();
        assert!(profile.suspended());
        let target_notes = svc.notes.list_for(target.id).await.unwrap();
        assert!(target_notes
            .iter()
            .any(|n| n.kind == NoteKind::Moderator && n.unread));
    }
}
