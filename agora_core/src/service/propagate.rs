//! The trigger layer binding the engines together. Every entity with a
//! defined apply behavior (post, vote, award) is routed through [`apply`]
//! exactly once on creation and once on deletion; the dispatch is an explicit
//! match invoked synchronously inside the mutating transaction, so ordering
//! and exactly-once semantics hold by construction.
//!
//! The single sanctioned bypass is per-session view counting; see
//! `posts::PostsService::register_view`.

use sea_orm::sea_query::Expr;
use sea_orm::ConnectionTrait;

use super::scoring;
use crate::entity::prelude::*;
use crate::ids::PostId;

/// Direction of a propagated change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The entity was created.
    Apply,
    /// The entity is being deleted; reverses the creation effect.
    Undo,
}

impl Direction {
    pub fn signum(self) -> i32 {
        match self {
            Direction::Apply => 1,
            Direction::Undo => -1,
        }
    }
}

/// A mutation whose side effects must reach denormalized state. Each entity
/// kind has a distinct, non-uniform effect.
pub enum Change<'a> {
    Post(&'a PostModel),
    Vote(&'a VoteModel),
    Award(&'a AwardModel),
}

pub(crate) async fn apply<C: ConnectionTrait>(
    conn: &C,
    change: Change<'_>,
    dir: Direction,
    hours_per_vote: u32,
) -> Result<(), DbErr> {
    let sign = dir.signum();
    match change {
        Change::Post(post) => match post.kind {
            PostKind::Answer => {
                bump_post_counter(conn, post.parent_id, PostColumn::AnswerCount, sign).await
            }
            PostKind::Comment => {
                bump_post_counter(conn, post.parent_id, PostColumn::CommentCount, sign).await
            }
            _ => Ok(()),
        },
        Change::Vote(vote) => scoring::apply_vote(conn, vote, sign, hours_per_vote).await,
        Change::Award(award) => scoring::apply_award(conn, award, sign).await,
    }
}

/// Atomic relative increment; never a blind overwrite.
async fn bump_post_counter<C: ConnectionTrait>(
    conn: &C,
    post_id: PostId,
    column: PostColumn,
    delta: i32,
) -> Result<(), DbErr> {
    Post::update_many()
        .col_expr(column, Expr::col(column).add(delta))
        .filter(PostColumn::Id.eq(post_id))
        .exec(conn)
        .await?;
    Ok(())
}
