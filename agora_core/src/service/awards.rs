use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use thiserror::Error;

use super::propagate::{self, Change, Direction};
use crate::entity::prelude::*;
use crate::ids::{AwardId, BadgeId, UserId};

#[derive(Debug, Error)]
pub enum AwardsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("badge not found")]
    BadgeNotFound,

    #[error("award not found")]
    AwardNotFound,
}

#[derive(Debug)]
pub enum GrantOutcome {
    Granted(AwardModel),
    /// The badge is unique and the user already holds it.
    AlreadyAwarded,
}

pub struct NewBadge {
    pub name: String,
    pub description: String,
    pub tier: BadgeTier,
    pub unique: bool,
    pub secret: bool,
}

#[derive(Clone)]
pub struct AwardsService {
    db: DatabaseConnection,
    hours_per_vote: u32,
}

impl AwardsService {
    pub fn new(db: DatabaseConnection, hours_per_vote: u32) -> Self {
        Self { db, hours_per_vote }
    }

    /// Creates a badge. The awarded count always starts at zero no matter
    /// what a bulk import supplies.
    pub async fn create_badge(&self, new: NewBadge) -> Result<BadgeModel, AwardsServiceError> {
        let badge = BadgeActiveModel {
            id: Set(BadgeId::new()),
            name: Set(new.name),
            description: Set(new.description),
            tier: Set(new.tier),
            unique: Set(new.unique),
            secret: Set(new.secret),
            count: Set(0),
        }
        .insert(&self.db)
        .await?;
        Ok(badge)
    }

    /// Lists badges; secret badges are withheld unless asked for.
    pub async fn list_badges(
        &self,
        include_secret: bool,
    ) -> Result<Vec<BadgeModel>, AwardsServiceError> {
        let mut query = Badge::find();
        if !include_secret {
            query = query.filter(BadgeColumn::Secret.eq(false));
        }
        let badges = query.order_by_asc(BadgeColumn::Name).all(&self.db).await?;
        Ok(badges)
    }

    /// Awards a badge to a user; unique badges at most once.
    pub async fn grant(
        &self,
        badge_id: BadgeId,
        user_id: UserId,
    ) -> Result<GrantOutcome, AwardsServiceError> {
        let txn = self.db.begin().await?;

        let badge = Badge::find_by_id(badge_id)
            .one(&txn)
            .await?
            .ok_or(AwardsServiceError::BadgeNotFound)?;

        if badge.unique {
            let held = Award::find()
                .filter(AwardColumn::BadgeId.eq(badge_id))
                .filter(AwardColumn::UserId.eq(user_id))
                .count(&txn)
                .await?;
            if held > 0 {
                return Ok(GrantOutcome::AlreadyAwarded);
            }
        }

        let award = AwardActiveModel {
            id: Set(AwardId::new()),
            badge_id: Set(badge_id),
            user_id: Set(user_id),
            date: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        propagate::apply(&txn, Change::Award(&award), Direction::Apply, self.hours_per_vote)
            .await?;
        txn.commit().await?;

        tracing::info!(badge = %badge_id, user = %user_id, "badge awarded");
        Ok(GrantOutcome::Granted(award))
    }

    /// Takes an award back, reversing its tallies.
    pub async fn revoke(&self, award_id: AwardId) -> Result<(), AwardsServiceError> {
        let txn = self.db.begin().await?;

        let award = Award::find_by_id(award_id)
            .one(&txn)
            .await?
            .ok_or(AwardsServiceError::AwardNotFound)?;

        propagate::apply(&txn, Change::Award(&award), Direction::Undo, self.hours_per_vote)
            .await?;
        Award::delete_by_id(award.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn awards_of(&self, user_id: UserId) -> Result<Vec<AwardModel>, AwardsServiceError> {
        let awards = Award::find()
            .filter(AwardColumn::UserId.eq(user_id))
            .order_by_asc(AwardColumn::Date)
            .all(&self.db)
            .await?;
        Ok(awards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_user, setup_test_db, test_services};

    #[tokio::test]
    async fn test_grant_updates_tallies() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "earner").await;

        let badge = svc
            .awards
            .create_badge(NewBadge {
                name: "Good Answer".into(),
                description: "Answer scored 5 or higher".into(),
                tier: BadgeTier::Silver,
                unique: false,
                secret: false,
            })
            .await
            .unwrap();

        svc.awards.grant(badge.id, user.id).await.unwrap();
        svc.awards.grant(badge.id, user.id).await.unwrap();

        let profile = svc.users.get_profile(user.id).await.unwrap();
        assert_eq!(profile.silver_badges, 2);
        assert_eq!(profile.bronze_badges, 0);

        let badges = svc.awards.list_badges(false).await.unwrap();
        assert_eq!(badges[0].count, 2);
    }

    #[tokio::test]
    async fn test_unique_badge_awarded_once() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "earner").await;

        let badge = svc
            .awards
            .create_badge(NewBadge {
                name: "Autobiographer".into(),
                description: "Filled out the profile".into(),
                tier: BadgeTier::Bronze,
                unique: true,
                secret: false,
            })
            .await
            .unwrap();

        let first = svc.awards.grant(badge.id, user.id).await.unwrap();
        assert!(matches!(first, GrantOutcome::Granted(_)));

        let second = svc.awards.grant(badge.id, user.id).await.unwrap();
        assert!(matches!(second, GrantOutcome::AlreadyAwarded));

        let profile = svc.users.get_profile(user.id).await.unwrap();
        assert_eq!(profile.bronze_badges, 1);
        assert_eq!(svc.awards.awards_of(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_reverses_grant() {
        let db = setup_test_db().await;
        let svc = test_services(&db);
        let (user, _) = create_test_user(&db, "earner").await;

        let badge = svc
            .awards
            .create_badge(NewBadge {
                name: "Popular Question".into(),
                description: "Question viewed 1000 times".into(),
                tier: BadgeTier::Gold,
                unique: false,
                secret: false,
            })
            .await
            .unwrap();

        let granted = match svc.awards.grant(badge.id, user.id).await.unwrap() {
            GrantOutcome::Granted(award) => award,
            GrantOutcome::AlreadyAwarded => panic!("badge is not unique"),
        };

        svc.awards.revoke(granted.id).await.unwrap();

        let profile = svc.users.get_profile(user.id).await.unwrap();
        assert_eq!(profile.gold_badges, 0);
        let badges = svc.awards.list_badges(false).await.unwrap();
        assert_eq!(badges[0].count, 0);
    }

    #[tokio::test]
    async fn test_secret_badges_hidden_from_listing() {
        let db = setup_test_db().await;
        let svc = test_services(&db);

        svc.awards
            .create_badge(NewBadge {
                name: "Secret Handshake".into(),
                description: "You know what you did".into(),
                tier: BadgeTier::Bronze,
                unique: true,
                secret: true,
            })
            .await
            .unwrap();

        assert!(svc.awards.list_badges(false).await.unwrap().is_empty());
        assert_eq!(svc.awards.list_badges(true).await.unwrap().len(), 1);
    }
}
