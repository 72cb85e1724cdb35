//! Seams to the collaborators this engine consumes but does not implement:
//! markup rendering, authorization and search indexing. Deployments plug in
//! their own; the defaults here are deliberately minimal and back the tests.

use crate::entity::prelude::{PostModel, ProfileModel};

/// Renders user-supplied markup into sanitized HTML. Invoked on post content,
/// profile about-me text and note content before persistence.
pub trait Markup: Send + Sync {
    fn render(&self, raw: &str) -> String;
}

/// Minimal renderer that escapes HTML-significant characters.
pub struct EscapeMarkup;

impl Markup for EscapeMarkup {
    fn render(&self, raw: &str) -> String {
        raw.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }
}

/// Consulted before any moderation or edit mutation.
pub trait Authorizer: Send + Sync {
    fn authorize_post_edit(&self, actor: &ProfileModel, post: &PostModel, strict: bool) -> bool;

    fn authorize_user_edit(&self, actor: &ProfileModel, target: &ProfileModel, strict: bool)
        -> bool;
}

/// Grants authors and moderators; under `strict` only authors and admins.
pub struct OwnerModeratorAuth;

impl Authorizer for OwnerModeratorAuth {
    fn authorize_post_edit(&self, actor: &ProfileModel, post: &PostModel, strict: bool) -> bool {
        if actor.suspended() {
            return false;
        }
        actor.user_id == post.author_id
            || actor.is_admin()
            || (!strict && actor.can_moderate())
    }

    fn authorize_user_edit(
        &self,
        actor: &ProfileModel,
        target: &ProfileModel,
        strict: bool,
    ) -> bool {
        if actor.suspended() {
            return false;
        }
        actor.user_id == target.user_id
            || actor.is_admin()
            || (!strict && actor.can_moderate() && !target.can_moderate())
    }
}

/// Full-text indexing hook. Fire-and-forget: failures must never block the
/// post transaction.
pub trait SearchIndex: Send + Sync {
    fn update(&self, post: &PostModel, created: bool);
}

/// Default indexer used when content indexing is switched off.
pub struct NoopIndex;

impl SearchIndex for NoopIndex {
    fn update(&self, _post: &PostModel, _created: bool) {}
}
