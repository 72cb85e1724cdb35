use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use thiserror::Error;
use uuid::Uuid;

use crate::collab::Markup;
use crate::entity::prelude::*;
use crate::ids::{ProfileId, UserId};

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("user not found")]
    UserNotFound,

    #[error("profile not found")]
    ProfileNotFound,
}

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Clone)]
pub struct UsersService {
    db: DatabaseConnection,
    markup: Arc<dyn Markup>,
}

impl UsersService {
    pub fn new(db: DatabaseConnection, markup: Arc<dyn Markup>) -> Self {
        Self { db, markup }
    }

    /// Creates a user together with its profile. The profile's last visit is
    /// pushed into the past so that new-post counters include existing
    /// content on the first real visit.
    pub async fn create_user(
        &self,
        new: NewUser,
    ) -> Result<(UserModel, ProfileModel), UsersServiceError> {
        let txn = self.db.begin().await?;

        let user = UserActiveModel {
            id: Set(UserId::new()),
            username: Set(new.username),
            email: Set(new.email),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let display_name = new
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user.username.clone());

        let profile = ProfileActiveModel {
            id: Set(ProfileId::new()),
            user_id: Set(user.id),
            display_name: Set(display_name),
            role: Set(UserRole::New),
            uuid: Set(Uuid::now_v7().simple().to_string()),
            score: Set(0),
            bronze_badges: Set(0),
            silver_badges: Set(0),
            gold_badges: Set(0),
            new_messages: Set(0),
            last_visited: Set(DateTime::<Utc>::UNIX_EPOCH),
            status: Set(UserStatus::Active),
            about_me: Set(String::new()),
            about_me_html: Set(String::new()),
            my_tags: Set(String::new()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::info!(user = %user.id, "user created");
        Ok((user, profile))
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<UserModel, UsersServiceError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(UsersServiceError::UserNotFound)
    }

    pub async fn get_profile(&self, user_id: UserId) -> Result<ProfileModel, UsersServiceError> {
        Profile::find()
            .filter(ProfileColumn::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(UsersServiceError::ProfileNotFound)
    }

    /// Stores the markup and its rendered form together.
    pub async fn update_about_me(
        &self,
        user_id: UserId,
        about_me: &str,
    ) -> Result<ProfileModel, UsersServiceError> {
        let profile = self.get_profile(user_id).await?;

        let mut profile_active: ProfileActiveModel = profile.into();
        profile_active.about_me = Set(about_me.to_owned());
        profile_active.about_me_html = Set(self.markup.render(about_me));
        let profile = profile_active.update(&self.db).await?;
        Ok(profile)
    }

    pub async fn set_my_tags(
        &self,
        user_id: UserId,
        my_tags: &str,
    ) -> Result<ProfileModel, UsersServiceError> {
        let profile = self.get_profile(user_id).await?;

        let mut profile_active: ProfileActiveModel = profile.into();
        profile_active.my_tags = Set(my_tags.to_owned());
        let profile = profile_active.update(&self.db).await?;
        Ok(profile)
    }

    pub async fn set_role(
        &self,
        user_id: UserId,
        role: UserRole,
    ) -> Result<ProfileModel, UsersServiceError> {
        let profile = self.get_profile(user_id).await?;

        let mut profile_active: ProfileActiveModel = profile.into();
        profile_active.role = Set(role);
        let profile = profile_active.update(&self.db).await?;
        Ok(profile)
    }

    pub async fn touch_visit(&self, user_id: UserId) -> Result<(), UsersServiceError> {
        let profile = self.get_profile(user_id).await?;

        let mut profile_active: ProfileActiveModel = profile.into();
        profile_active.last_visited = Set(Utc::now());
        profile_active.update(&self.db).await?;
        Ok(())
    }

    /// Removes a user; the profile and all owned rows go with it.
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), UsersServiceError> {
        let user = self.get_user(user_id).await?;
        User::delete_by_id(user.id).exec(&self.db).await?;
        Ok(())
    }
}
