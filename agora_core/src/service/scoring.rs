//! Score, rank and reputation arithmetic. Only the propagator calls into this
//! module, so every counter has a single authoritative update path.

use sea_orm::ConnectionTrait;

use crate::entity::prelude::*;
use crate::ids::UserId;

/// Rank is measured in seconds; an up-vote is worth this many per hour.
pub(crate) const RANK_GAIN_PER_HOUR: f64 = 3600.0;

/// Applies the effect of a vote. `dir` is +1 when the vote is cast and -1
/// when it is undone (deleted); undo restores the pre-vote state exactly.
pub(crate) async fn apply_vote<C: ConnectionTrait>(
    conn: &C,
    vote: &VoteModel,
    dir: i32,
    hours_per_vote: u32,
) -> Result<(), DbErr> {
    let post = Post::find_by_id(vote.post_id)
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("post {}", vote.post_id)))?;

    match vote.kind {
        VoteKind::Up => {
            let gain = f64::from(dir) * RANK_GAIN_PER_HOUR * f64::from(hours_per_vote);
            post_score_change(conn, &post, dir, gain).await?;
            user_score_change(conn, post.author_id, dir).await?;
        }
        VoteKind::Down => {
            post_score_change(conn, &post, -dir, 0.0).await?;
        }
        VoteKind::Accept => {
            let accepted = dir == 1;
            let mut post_active: PostActiveModel = post.clone().into();
            post_active.accepted = Set(accepted);
            post_active.update(conn).await?;

            if !post.is_root() {
                let root = Post::find_by_id(post.root_id)
                    .one(conn)
                    .await?
                    .ok_or_else(|| DbErr::RecordNotFound(format!("root {}", post.root_id)))?;
                let mut root_active: PostActiveModel = root.into();
                root_active.accepted = Set(accepted);
                root_active.update(conn).await?;
            }
        }
        VoteKind::Bookmark => {}
    }

    Ok(())
}

/// How a post's score changes with votes. The score always moves by `amount`;
/// the rank only moves for up-votes (`rank_gain` nonzero). The thread root
/// aggregates the score into its full_score, and its rank is pulled up to the
/// post's rank whenever the post's rank increased.
async fn post_score_change<C: ConnectionTrait>(
    conn: &C,
    post: &PostModel,
    amount: i32,
    rank_gain: f64,
) -> Result<(), DbErr> {
    let new_rank = post.rank + rank_gain;

    let mut post_active: PostActiveModel = post.clone().into();
    post_active.score = Set(post.score + amount);
    if rank_gain != 0.0 {
        post_active.rank = Set(new_rank);
    }
    if post.is_root() {
        post_active.full_score = Set(post.full_score + amount);
    }
    post_active.update(conn).await?;

    if !post.is_root() {
        let root = Post::find_by_id(post.root_id)
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("root {}", post.root_id)))?;
        let mut root_active: PostActiveModel = root.clone().into();
        root_active.full_score = Set(root.full_score + amount);
        if rank_gain > 0.0 && new_rank > root.rank {
            root_active.rank = Set(new_rank);
        }
        root_active.update(conn).await?;
    }

    Ok(())
}

/// How a user's reputation changes with votes.
async fn user_score_change<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    amount: i32,
) -> Result<(), DbErr> {
    let profile = Profile::find()
        .filter(ProfileColumn::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("profile of user {user_id}")))?;

    let mut profile_active: ProfileActiveModel = profile.clone().into();
    profile_active.score = Set(profile.score + amount);
    profile_active.update(conn).await?;

    Ok(())
}

/// Applies the effect of an award: the matching badge tally on the holder's
/// profile and the badge's total count, both by `dir`.
pub(crate) async fn apply_award<C: ConnectionTrait>(
    conn: &C,
    award: &AwardModel,
    dir: i32,
) -> Result<(), DbErr> {
    let badge = Badge::find_by_id(award.badge_id)
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("badge {}", award.badge_id)))?;
    let profile = Profile::find()
        .filter(ProfileColumn::UserId.eq(award.user_id))
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("profile of user {}", award.user_id)))?;

    let mut profile_active: ProfileActiveModel = profile.clone().into();
    match badge.tier {
        BadgeTier::Bronze => profile_active.bronze_badges = Set(profile.bronze_badges + dir),
        BadgeTier::Silver => profile_active.silver_badges = Set(profile.silver_badges + dir),
        BadgeTier::Gold => profile_active.gold_badges = Set(profile.gold_badges + dir),
    }
    profile_active.update(conn).await?;

    let mut badge_active: BadgeActiveModel = badge.clone().into();
    badge_active.count = Set(badge.count + dir);
    badge_active.update(conn).await?;

    Ok(())
}
