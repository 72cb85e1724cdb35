use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use thiserror::Error;

use super::propagate::{self, Change, Direction};
use crate::entity::prelude::*;
use crate::ids::{PostId, UserId, VoteId};

#[derive(Debug, Error)]
pub enum VotesServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("post not found")]
    PostNotFound,
}

#[derive(Debug)]
pub enum VoteOutcome {
    Added(VoteModel),
    Removed,
}

#[derive(Clone)]
pub struct VotesService {
    db: DatabaseConnection,
    hours_per_vote: u32,
}

impl VotesService {
    pub fn new(db: DatabaseConnection, hours_per_vote: u32) -> Self {
        Self { db, hours_per_vote }
    }

    /// Applies a vote. Re-casting an existing vote kind removes it (toggle);
    /// casting one of an opposing pair replaces the other.
    pub async fn cast(
        &self,
        author: UserId,
        post_id: PostId,
        kind: VoteKind,
    ) -> Result<VoteOutcome, VotesServiceError> {
        let txn = self.db.begin().await?;

        if Post::find_by_id(post_id).one(&txn).await?.is_none() {
            return Err(VotesServiceError::PostNotFound);
        }

        // Duplicate submissions (vote-button spamming) can race past the
        // read-then-decide check; whatever same-kind votes exist by now are
        // collapsed into a single toggle-off.
        let existing = Vote::find()
            .filter(VoteColumn::PostId.eq(post_id))
            .filter(VoteColumn::AuthorId.eq(author))
            .filter(VoteColumn::Kind.eq(kind))
            .all(&txn)
            .await?;

        if !existing.is_empty() {
            for vote in &existing {
                propagate::apply(&txn, Change::Vote(vote), Direction::Undo, self.hours_per_vote)
                    .await?;
                Vote::delete_by_id(vote.id).exec(&txn).await?;
            }
            txn.commit().await?;
            tracing::info!(%author, %post_id, "{} removed", kind.label());
            return Ok(VoteOutcome::Removed);
        }

        if let Some(opposing) = kind.opposing() {
            let opposed = Vote::find()
                .filter(VoteColumn::PostId.eq(post_id))
                .filter(VoteColumn::AuthorId.eq(author))
                .filter(VoteColumn::Kind.eq(opposing))
                .all(&txn)
                .await?;
            for vote in opposed {
                propagate::apply(&txn, Change::Vote(&vote), Direction::Undo, self.hours_per_vote)
                    .await?;
                Vote::delete_by_id(vote.id).exec(&txn).await?;
            }
        }

        let vote = VoteActiveModel {
            id: Set(VoteId::new()),
            author_id: Set(author),
            post_id: Set(post_id),
            kind: Set(kind),
            date: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        propagate::apply(&txn, Change::Vote(&vote), Direction::Apply, self.hours_per_vote)
            .await?;
        txn.commit().await?;

        tracing::info!(%author, %post_id, "{} added", kind.label());
        Ok(VoteOutcome::Added(vote))
    }

    pub async fn votes_on(&self, post_id: PostId) -> Result<Vec<VoteModel>, VotesServiceError> {
        let votes = Vote::find()
            .filter(VoteColumn::PostId.eq(post_id))
            .order_by_asc(VoteColumn::Date)
            .all(&self.db)
            .await?;
        Ok(votes)
    }

    pub async fn votes_by(&self, author: UserId) -> Result<Vec<VoteModel>, VotesServiceError> {
        let votes = Vote::find()
            .filter(VoteColumn::AuthorId.eq(author))
            .order_by_asc(VoteColumn::Date)
            .all(&self.db)
            .await?;
        Ok(votes)
    }
}
