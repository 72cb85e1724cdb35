//! Notes: simple notifications that stay active until the target reads or
//! deletes them. The target profile's new-message counter tracks the set of
//! currently-unread notes exactly; every path that flips a note's unread
//! state moves the counter in the same transaction.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::prelude::DateTimeUtc;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use thiserror::Error;

use crate::collab::Markup;
use crate::entity::prelude::*;
use crate::ids::{NoteId, UserId};

/// Notes persist at most this much of a url.
pub(crate) const MAX_URL_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum NotesServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("note not found")]
    NoteNotFound,
}

pub struct SendNote<'a> {
    pub sender: UserId,
    pub target: UserId,
    pub content: &'a str,
    pub kind: NoteKind,
    pub unread: bool,
    pub url: &'a str,
    /// When set, the sender keeps an always-read copy of the note.
    pub both: bool,
    pub date: DateTimeUtc,
}

/// Stores one note for the target, and optionally the sender's own copy.
pub(crate) async fn send_note<C: ConnectionTrait>(
    conn: &C,
    markup: &dyn Markup,
    note: SendNote<'_>,
) -> Result<NoteModel, DbErr> {
    let url: String = note.url.chars().take(MAX_URL_LEN).collect();
    let html = markup.render(note.content);

    let stored = NoteActiveModel {
        id: Set(NoteId::new()),
        sender_id: Set(note.sender),
        target_id: Set(note.target),
        content: Set(note.content.to_owned()),
        html: Set(html.clone()),
        date: Set(note.date),
        unread: Set(note.unread),
        kind: Set(note.kind),
        url: Set(url.clone()),
    }
    .insert(conn)
    .await?;

    if stored.unread {
        bump_new_messages(conn, note.target, 1).await?;
    }

    if note.both && note.sender != note.target {
        NoteActiveModel {
            id: Set(NoteId::new()),
            sender_id: Set(note.sender),
            target_id: Set(note.sender),
            content: Set(note.content.to_owned()),
            html: Set(html),
            date: Set(note.date),
            unread: Set(false),
            kind: Set(note.kind),
            url: Set(url),
        }
        .insert(conn)
        .await?;
    }

    Ok(stored)
}

/// Generates notes for every user related to this post. Invoked only on the
/// creation of the post. The unread flag is off for the post's own author.
pub(crate) async fn post_create_notification<C: ConnectionTrait>(
    conn: &C,
    markup: &dyn Markup,
    post: &PostModel,
) -> Result<(), DbErr> {
    let root = Post::find_by_id(post.root_id)
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("root {}", post.root_id)))?;

    let mut authors: HashSet<UserId> = HashSet::new();
    authors.insert(root.author_id);
    for descendant in Post::find()
        .filter(PostColumn::RootId.eq(root.id))
        .all(conn)
        .await?
    {
        authors.insert(descendant.author_id);
    }

    let text = post_action_text(post, &root);
    let url = post.url_in(&root);

    for target in authors {
        let unread = target != post.author_id;
        send_note(
            conn,
            markup,
            SendNote {
                sender: post.author_id,
                target,
                content: &text,
                kind: NoteKind::User,
                unread,
                url: &url,
                both: false,
                date: post.creation_date,
            },
        )
        .await?;
    }

    Ok(())
}

fn post_action_text(post: &PostModel, root: &PostModel) -> String {
    format!("{} added on: {}", post.kind.label(), root.title)
}

pub(crate) fn post_moderator_text(actor: &ProfileModel, post: &PostModel) -> String {
    format!(
        "moderator {} set the status of '{}' to {:?}",
        actor.display_name, post.title, post.status
    )
}

pub(crate) fn user_moderator_text(actor: &ProfileModel, target: &ProfileModel) -> String {
    format!(
        "moderator {} set the status of user {} to {:?}",
        actor.display_name, target.display_name, target.status
    )
}

async fn bump_new_messages<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    delta: i32,
) -> Result<(), DbErr> {
    let profile = Profile::find()
        .filter(ProfileColumn::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("profile of user {user_id}")))?;

    let mut profile_active: ProfileActiveModel = profile.clone().into();
    profile_active.new_messages = Set((profile.new_messages + delta).max(0));
    profile_active.update(conn).await?;

    Ok(())
}

#[derive(Clone)]
pub struct NotesService {
    db: DatabaseConnection,
    markup: std::sync::Arc<dyn Markup>,
}

impl NotesService {
    pub fn new(db: DatabaseConnection, markup: std::sync::Arc<dyn Markup>) -> Self {
        Self { db, markup }
    }

    /// Direct user-to-user note.
    pub async fn send(
        &self,
        sender: UserId,
        target: UserId,
        content: &str,
        url: &str,
    ) -> Result<NoteModel, NotesServiceError> {
        let txn = self.db.begin().await?;
        let note = send_note(
            &txn,
            self.markup.as_ref(),
            SendNote {
                sender,
                target,
                content,
                kind: NoteKind::User,
                unread: true,
                url,
                both: false,
                date: Utc::now(),
            },
        )
        .await?;
        txn.commit().await?;
        Ok(note)
    }

    pub async fn list_for(&self, target: UserId) -> Result<Vec<NoteModel>, NotesServiceError> {
        let notes = Note::find()
            .filter(NoteColumn::TargetId.eq(target))
            .order_by_desc(NoteColumn::Date)
            .all(&self.db)
            .await?;
        Ok(notes)
    }

    pub async fn unread_count(&self, target: UserId) -> Result<u64, NotesServiceError> {
        let count = Note::find()
            .filter(NoteColumn::TargetId.eq(target))
            .filter(NoteColumn::Unread.eq(true))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, note_id: NoteId) -> Result<NoteModel, NotesServiceError> {
        let txn = self.db.begin().await?;
        let note = Note::find_by_id(note_id)
            .one(&txn)
            .await?
            .ok_or(NotesServiceError::NoteNotFound)?;

        if !note.unread {
            txn.commit().await?;
            return Ok(note);
        }

        let target = note.target_id;
        let mut note_active: NoteActiveModel = note.into();
        note_active.unread = Set(false);
        let note = note_active.update(&txn).await?;
        bump_new_messages(&txn, target, -1).await?;
        txn.commit().await?;
        Ok(note)
    }

    pub async fn delete(&self, note_id: NoteId) -> Result<(), NotesServiceError> {
        let txn = self.db.begin().await?;
        let note = Note::find_by_id(note_id)
            .one(&txn)
            .await?
            .ok_or(NotesServiceError::NoteNotFound)?;

        if note.unread {
            bump_new_messages(&txn, note.target_id, -1).await?;
        }
        Note::delete_by_id(note.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_user, setup_test_db, test_services};

    #[tokio::test]
    async fn test_unread_counter_tracks_unread_notes() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (sender, _) = create_test_user(&db, "sender").await;
        let (target, _) = create_test_user(&db, "target").await;

        let note = svc
            .notes
            .send(sender.id, target.id, "hello there", "/post/1")
            .await
            .unwrap();
        assert!(note.unread);
        assert_eq!(svc.users.get_profile(target.id).await.unwrap().new_messages, 1);
        assert_eq!(svc.notes.unread_count(target.id).await.unwrap(), 1);

        svc.notes.mark_read(note.id).await.unwrap();
        assert_eq!(svc.users.get_profile(target.id).await.unwrap().new_messages, 0);
        assert_eq!(svc.notes.unread_count(target.id).await.unwrap(), 0);

        // marking an already-read note again is a no-op
        svc.notes.mark_read(note.id).await.unwrap();
        assert_eq!(svc.users.get_profile(target.id).await.unwrap().new_messages, 0);
    }

    #[tokio::test]
    async fn test_deleting_unread_note_decrements_counter() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (sender, _) = create_test_user(&db, "sender").await;
        let (target, _) = create_test_user(&db, "target").await;

        let note = svc
            .notes
            .send(sender.id, target.id, "short lived", "")
            .await
            .unwrap();
        assert_eq!(svc.users.get_profile(target.id).await.unwrap().new_messages, 1);

        svc.notes.delete(note.id).await.unwrap();
        assert_eq!(svc.users.get_profile(target.id).await.unwrap().new_messages, 0);
        assert!(svc.notes.list_for(target.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_both_stores_an_always_read_sender_copy() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (sender, _) = create_test_user(&db, "sender").await;
        let (target, _) = create_test_user(&db, "target").await;

        let txn = db.begin().await.unwrap();
        send_note(
            &txn,
            &crate::collab::EscapeMarkup,
            SendNote {
                sender: sender.id,
                target: target.id,
                content: "status changed",
                kind: NoteKind::Moderator,
                unread: true,
                url: "/post/42",
                both: true,
                date: Utc::now(),
            },
        )
        .await
        .unwrap();
        txn.commit().await.unwrap();

        let sender_notes = svc.notes.list_for(sender.id).await.unwrap();
        assert_eq!(sender_notes.len(), 1);
        assert!(!sender_notes[0].unread);
        // the sender's copy never touches their unread counter
        assert_eq!(svc.users.get_profile(sender.id).await.unwrap().new_messages, 0);
        assert_eq!(svc.users.get_profile(target.id).await.unwrap().new_messages, 1);
    }

    #[tokio::test]
    async fn test_note_url_is_truncated() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (sender, _) = create_test_user(&db, "sender").await;
        let (target, _) = create_test_user(&db, "target").await;

        let long_url = "x".repeat(MAX_URL_LEN + 50);
        let note = svc
            .notes
            .send(sender.id, target.id, "see this", &long_url)
            .await
            .unwrap();

        assert_eq!(note.url.len(), MAX_URL_LEN);
    }

    #[tokio::test]
    async fn test_note_content_is_rendered() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (sender, _) = create_test_user(&db, "sender").await;
        let (target, _) = create_test_user(&db, "target").await;

        let note = svc
            .notes
            .send(sender.id, target.id, "a < b", "")
            .await
            .unwrap();

        assert_eq!(note.content, "a < b");
        assert_eq!(note.html, "a &lt; b");
    }
}
