pub mod awards;
pub mod moderation;
pub mod notes;
pub mod posts;
pub mod propagate;
pub mod revisions;
pub mod scoring;
pub mod tags;
pub mod users;
pub mod votes;
