pub mod collab;
pub mod config;
pub mod entity;
pub mod ids;
pub mod models;
pub mod service;
pub mod test_utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

use crate::collab::{Authorizer, EscapeMarkup, Markup, NoopIndex, OwnerModeratorAuth, SearchIndex};
use crate::service::awards::AwardsService;
use crate::service::moderation::ModerationService;
use crate::service::notes::NotesService;
use crate::service::posts::PostsService;
use crate::service::tags::TagsService;
use crate::service::users::UsersService;
use crate::service::votes::VotesService;

static AGORA_CORE: OnceCell<Arc<AgoraCore>> = OnceCell::const_new();

pub async fn core() -> Arc<AgoraCore> {
    AGORA_CORE
        .get_or_init(|| async move { Arc::new(AgoraCore::start().await.expect("failed to init")) })
        .await
        .clone()
}

/// The collaborator implementations a deployment plugs in. The defaults are
/// the minimal ones used in tests.
pub struct Collaborators {
    pub markup: Arc<dyn Markup>,
    pub authorizer: Arc<dyn Authorizer>,
    pub search: Arc<dyn SearchIndex>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            markup: Arc::new(EscapeMarkup),
            authorizer: Arc::new(OwnerModeratorAuth),
            search: Arc::new(NoopIndex),
        }
    }
}

/// Main runtime handle for Agora.
pub struct AgoraCore {
    pub config: config::AgoraConfig,
    pub db: DatabaseConnection,

    pub users: UsersService,
    pub posts: PostsService,
    pub votes: VotesService,
    pub notes: NotesService,
    pub tags: TagsService,
    pub awards: AwardsService,
    pub moderation: ModerationService,
}

impl AgoraCore {
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        let config = config::get_or_init().await?;
        Self::start_with(config, Collaborators::default()).await
    }

    pub async fn start_with(
        config: config::AgoraConfig,
        collaborators: Collaborators,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        // DB + migrations
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        let Collaborators {
            markup,
            authorizer,
            search,
        } = collaborators;

        let users = UsersService::new(db.clone(), markup.clone());
        let posts = PostsService::new(
            db.clone(),
            markup.clone(),
            authorizer.clone(),
            search,
            config.content_indexing,
            config.hours_per_vote,
        );
        let votes = VotesService::new(db.clone(), config.hours_per_vote);
        let notes = NotesService::new(db.clone(), markup.clone());
        let tags = TagsService::new(db.clone());
        let awards = AwardsService::new(db.clone(), config.hours_per_vote);
        let moderation =
            ModerationService::new(db.clone(), authorizer, markup, config.hours_per_vote);

        Ok(Self {
            config,
            db,
            users,
            posts,
            votes,
            notes,
            tags,
            awards,
            moderation,
        })
    }
}

pub mod prelude {
    pub use super::collab;
    pub use super::config;
    pub use super::entity;
    pub use super::ids;
    pub use super::models;
    pub use super::service;
}
