use sea_orm_migration::prelude::*;

mod m20260115_000001_create_user_table;
mod m20260115_000002_create_profile_table;
mod m20260115_000003_create_post_table;
mod m20260115_000004_create_tag_table;
mod m20260115_000005_create_post_tag_table;
mod m20260115_000006_create_vote_table;
mod m20260115_000007_create_badge_table;
mod m20260115_000008_create_award_table;
mod m20260115_000009_create_note_table;
mod m20260115_000010_create_post_revision_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260115_000001_create_user_table::Migration),
            Box::new(m20260115_000002_create_profile_table::Migration),
            Box::new(m20260115_000003_create_post_table::Migration),
            Box::new(m20260115_000004_create_tag_table::Migration),
            Box::new(m20260115_000005_create_post_tag_table::Migration),
            Box::new(m20260115_000006_create_vote_table::Migration),
            Box::new(m20260115_000007_create_badge_table::Migration),
            Box::new(m20260115_000008_create_award_table::Migration),
            Box::new(m20260115_000009_create_note_table::Migration),
            Box::new(m20260115_000010_create_post_revision_table::Migration),
        ]
    }
}

#[cfg(test)]
use sea_orm::{Database, DbErr};

#[tokio::test]
async fn test_migrations_okay() -> Result<(), DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let schema_manager = SchemaManager::new(&db);

    Migrator::refresh(&db).await?;

    assert!(schema_manager.has_table("user").await?);
    assert!(schema_manager.has_table("profile").await?);
    assert!(schema_manager.has_table("post").await?);
    assert!(schema_manager.has_table("tag").await?);
    assert!(schema_manager.has_table("post_tag").await?);
    assert!(schema_manager.has_table("vote").await?);
    assert!(schema_manager.has_table("badge").await?);
    assert!(schema_manager.has_table("award").await?);
    assert!(schema_manager.has_table("note").await?);
    assert!(schema_manager.has_table("post_revision").await?);

    Ok(())
}
