use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{map_unique_violation, DatabaseError};
use crate::database::models::{NewUser, User};
use crate::rank::{Rank, SubscriptionStatus};

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_auth_ref(
    pool: &PgPool,
    auth_ref: &str,
) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE auth_ref = $1")
        .bind(auth_ref)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// List users, optionally restricted to one organization. Admirals list
/// cross-organization by passing None.
pub async fn list(pool: &PgPool, org_slug: Option<&str>) -> Result<Vec<User>, DatabaseError> {
    let users = match org_slug {
        Some(org) => {
            sqlx::query_as::<_, User>(
                "SELECT * FROM users WHERE org_slug = $1 ORDER BY created_at",
            )
            .bind(org)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(users)
}

/// Create a user on first successful authentication. A duplicate email or
/// auth reference fails with `Duplicate` and creates no record.
pub async fn insert(pool: &PgPool, new_user: &NewUser) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (auth_ref, email, name, avatar_key, trial_started_at, trial_ends_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(&new_user.auth_ref)
    .bind(&new_user.email)
    .bind(&new_user.name)
    .bind(&new_user.avatar_key)
    .bind(new_user.trial_started_at)
    .bind(new_user.trial_ends_at)
    .fetch_one(pool)
    .await
    .map_err(map_unique_violation)
}

/// Refresh only the identity-volatile fields from the provider. Setup state,
/// trial timers, theme, widgets and profile fields are never touched here.
pub async fn refresh_identity(
    pool: &PgPool,
    id: Uuid,
    email: &str,
    name: Option<&str>,
    avatar_key: Option<&str>,
) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "UPDATE users
         SET email = $2,
             name = COALESCE($3, name),
             avatar_key = COALESCE($4, avatar_key),
             updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(email)
    .bind(name)
    .bind(avatar_key)
    .fetch_one(pool)
    .await
    .map_err(map_unique_violation)
}

/// Apply a trial-expiry demotion decided at login-check time.
pub async fn apply_demotion(
    pool: &PgPool,
    id: Uuid,
    rank: Rank,
    status: SubscriptionStatus,
) -> Result<User, DatabaseError> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET rank = $2, subscription_status = $3, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(rank)
    .bind(status)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn set_rank(pool: &PgPool, id: Uuid, rank: Rank) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET rank = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(rank)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("user not found".to_string()))
}

/// Set the subscription status and trial end together. The trial end is
/// written as given: passing None clears it, e.g. on a lifetime upgrade.
pub async fn set_subscription(
    pool: &PgPool,
    id: Uuid,
    status: SubscriptionStatus,
    trial_ends_at: Option<DateTime<Utc>>,
) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "UPDATE users
         SET subscription_status = $2,
             trial_ends_at = $3,
             updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(trial_ends_at)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("user not found".to_string()))
}

pub async fn set_profile(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    org_slug: Option<&str>,
) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "UPDATE users
         SET name = COALESCE($2, name),
             org_slug = COALESCE($3, org_slug),
             updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(org_slug)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("user not found".to_string()))
}

pub async fn set_theme(pool: &PgPool, id: Uuid, theme: &str) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET theme = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(theme)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("user not found".to_string()))
}

pub async fn set_widgets(
    pool: &PgPool,
    id: Uuid,
    widgets: Vec<String>,
) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET dashboard_widgets = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(Json(widgets))
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("user not found".to_string()))
}

pub async fn set_avatar(
    pool: &PgPool,
    id: Uuid,
    avatar_key: &str,
) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET avatar_key = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(avatar_key)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("user not found".to_string()))
}

pub async fn set_email(pool: &PgPool, id: Uuid, email: &str) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET email = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(map_unique_violation)?
    .ok_or_else(|| DatabaseError::NotFound("user not found".to_string()))
}

pub async fn set_setup_complete(pool: &PgPool, id: Uuid) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET setup_status = 'complete', updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("user not found".to_string()))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
