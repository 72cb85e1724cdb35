//! In-memory database helpers and shared fixtures for tests. Each call to
//! [`setup_test_db`] creates a fresh, isolated database instance.

use std::sync::Arc;

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::collab::{EscapeMarkup, NoopIndex, OwnerModeratorAuth};
use crate::entity::prelude::*;
use crate::ids::UserId;
use crate::models::migrator::Migrator;
use crate::service::awards::AwardsService;
use crate::service::moderation::ModerationService;
use crate::service::notes::NotesService;
use crate::service::posts::{NewPost, PostsService};
use crate::service::tags::TagsService;
use crate::service::users::{NewUser, UsersService};
use crate::service::votes::VotesService;

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// The full service set wired with the default collaborators, one rank hour
/// per vote and indexing off.
pub struct TestServices {
    pub users: UsersService,
    pub posts: PostsService,
    pub votes: VotesService,
    pub notes: NotesService,
    pub tags: TagsService,
    pub awards: AwardsService,
    pub moderation: ModerationService,
}

pub fn test_services(db: &DatabaseConnection) -> TestServices {
    let markup = Arc::new(EscapeMarkup);
    let authorizer = Arc::new(OwnerModeratorAuth);

    TestServices {
        users: UsersService::new(db.clone(), markup.clone()),
        posts: PostsService::new(
            db.clone(),
            markup.clone(),
            authorizer.clone(),
            Arc::new(NoopIndex),
            false,
            1,
        ),
        votes: VotesService::new(db.clone(), 1),
        notes: NotesService::new(db.clone(), markup.clone()),
        tags: TagsService::new(db.clone()),
        awards: AwardsService::new(db.clone(), 1),
        moderation: ModerationService::new(db.clone(), authorizer, markup, 1),
    }
}

pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
) -> (UserModel, ProfileModel) {
    UsersService::new(db.clone(), Arc::new(EscapeMarkup))
        .create_user(NewUser {
            username: name.to_owned(),
            email: format!("{name}@example.com"),
            display_name: None,
        })
        .await
        .expect("Failed to create test user")
}

pub async fn create_test_moderator(
    db: &DatabaseConnection,
    name: &str,
) -> (UserModel, ProfileModel) {
    let users = UsersService::new(db.clone(), Arc::new(EscapeMarkup));
    let (user, _) = users
        .create_user(NewUser {
            username: name.to_owned(),
            email: format!("{name}@example.com"),
            display_name: None,
        })
        .await
        .expect("Failed to create test user");
    let profile = users
        .set_role(user.id, UserRole::Moderator)
        .await
        .expect("Failed to promote test user");
    (user, profile)
}

pub async fn question_by(svc: &TestServices, author: UserId, title: &str) -> PostModel {
    svc.posts
        .create_post(NewPost {
            author,
            kind: PostKind::Question,
            title: title.to_owned(),
            content: "A body long enough to matter.".to_owned(),
            tag_val: String::new(),
            parent: None,
            url: String::new(),
        })
        .await
        .expect("Failed to create test question")
}

pub async fn answer_to(svc: &TestServices, author: UserId, parent: crate::ids::PostId) -> PostModel {
    svc.posts
        .create_post(NewPost {
            author,
            kind: PostKind::Answer,
            title: String::new(),
            content: "An answer worth reading.".to_owned(),
            tag_val: String::new(),
            parent: Some(parent),
            url: String::new(),
        })
        .await
        .expect("Failed to create test answer")
}

pub async fn comment_on(svc: &TestServices, author: UserId, parent: crate::ids::PostId) -> PostModel {
    svc.posts
        .create_post(NewPost {
            author,
            kind: PostKind::Comment,
            title: String::new(),
            content: "A quick remark.".to_owned(),
            tag_val: String::new(),
            parent: Some(parent),
            url: String::new(),
        })
        .await
        .expect("Failed to create test comment")
}
