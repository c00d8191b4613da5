//! Database-backed user repository tests. Skipped when DATABASE_URL is not
//! set, matching how the server itself degrades without a database.

use anyhow::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

use fuse_api::database::models::NewUser;
use fuse_api::database::{users, DatabaseManager};
use fuse_api::rank::{SetupStatus, SubscriptionStatus};

fn database_available() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

async fn create_user(tag: &str) -> Result<fuse_api::database::models::User> {
    DatabaseManager::migrate().await?;
    let pool = DatabaseManager::main_pool().await?;

    let now = Utc::now();
    let new_user = NewUser {
        auth_ref: format!("idp_test_{}", tag),
        email: format!("{}@example.com", tag),
        name: None,
        avatar_key: None,
        trial_started_at: now,
        trial_ends_at: now + Duration::days(14),
    };
    Ok(users::insert(&pool, &new_user).await?)
}

#[tokio::test]
async fn refresh_never_regresses_setup_or_trial_anchor() -> Result<()> {
    if !database_available() {
        return Ok(());
    }

    let tag = Uuid::new_v4().simple().to_string();
    let created = create_user(&tag).await?;
    let pool = DatabaseManager::main_pool().await?;

    let completed = users::set_setup_complete(&pool, created.id).await?;
    assert_eq!(completed.setup_status, SetupStatus::Complete);

    // A repeat login refreshes identity-volatile fields only
    let refreshed = users::refresh_identity(
        &pool,
        created.id,
        &format!("renamed-{}@example.com", tag),
        Some("Renamed"),
        Some("avatars/new.png"),
    )
    .await?;

    assert_eq!(refreshed.setup_status, SetupStatus::Complete);
    assert_eq!(refreshed.trial_started_at, completed.trial_started_at);
    assert_eq!(refreshed.trial_ends_at, completed.trial_ends_at);
    assert_eq!(refreshed.name.as_deref(), Some("Renamed"));

    users::delete(&pool, created.id).await?;
    Ok(())
}

#[tokio::test]
async fn lifetime_upgrade_clears_the_trial_end() -> Result<()> {
    if !database_available() {
        return Ok(());
    }

    let tag = Uuid::new_v4().simple().to_string();
    let created = create_user(&tag).await?;
    assert!(created.trial_ends_at.is_some());
    let pool = DatabaseManager::main_pool().await?;

    let updated =
        users::set_subscription(&pool, created.id, SubscriptionStatus::Lifetime, None).await?;
    assert_eq!(updated.subscription_status, SubscriptionStatus::Lifetime);
    assert!(updated.trial_ends_at.is_none());

    users::delete(&pool, created.id).await?;
    Ok(())
}
