//! Admin user management. List and subscription changes are commodore+,
//! rank changes are admiral-only, deletion is commodore+ with the
//! organization boundary and rank precedence enforced per target.

use axum::extract::Path;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::{users, DatabaseManager};
use crate::error::ApiError;
use crate::guard;
use crate::identity;
use crate::middleware::ApiResponse;
use crate::rank::{Rank, SubscriptionStatus};
use crate::services::deletion::{self, DeletionRequest};
use crate::services::session::remint_cookie;
use crate::session::cookie::set_cookie_headers;
use crate::session::policy::SessionField;
use crate::session::SessionState;

#[derive(Debug, Deserialize)]
pub struct RankUpdate {
    pub rank: Rank,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionUpdate {
    pub subscription_status: SubscriptionStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SingleDeletion {
    pub reason: String,
    pub confirmation: String,
}

/// GET /api/users - commodore+ roster, scoped to the caller's organization
/// unless the caller is an admiral.
pub async fn users_list(
    Extension(session): Extension<SessionState>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let actor = guard::require_rank(&pool, &session, Rank::Commodore).await?;

    let listed = users::list(&pool, guard::org_filter(&actor)).await?;
    Ok(ApiResponse::success(listed))
}

/// PUT /api/users/:id/rank - admiral-only promotion or demotion. An admiral
/// changing their own rank gets an immediately re-minted cookie.
pub async fn rank_put(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RankUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let actor = guard::require_rank(&pool, &session, Rank::Admiral).await?;

    let updated = users::set_rank(&pool, id, payload.rank).await?;

    let headers = if updated.id == actor.id {
        match remint_cookie(&updated, SessionField::Rank)? {
            Some(cookie) => set_cookie_headers(&cookie),
            None => HeaderMap::new(),
        }
    } else {
        HeaderMap::new()
    };
    Ok((headers, ApiResponse::success(updated)))
}

/// PUT /api/users/:id/subscription - commodore+ within their own
/// organization; admirals cross it.
pub async fn subscription_put(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubscriptionUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let actor = guard::require_rank(&pool, &session, Rank::Commodore).await?;

    let target = users::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User record not found"))?;
    if !actor.rank.meets(Rank::Admiral) && target.org_slug != actor.org_slug {
        return Err(ApiError::unauthorized("Target outside your organization"));
    }

    let updated = users::set_subscription(
        &pool,
        id,
        payload.subscription_status,
        payload.trial_ends_at,
    )
    .await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/users/:id - single-target cascade deletion.
pub async fn user_delete(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SingleDeletion>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let actor = guard::require_rank(&pool, &session, Rank::Commodore).await?;

    let request = DeletionRequest {
        targets: vec![id],
        reason: payload.reason,
        confirmation: payload.confirmation,
    };
    let report = deletion::delete_users(identity::provider().as_ref(), &actor, &request).await?;
    Ok(ApiResponse::success(report))
}

/// POST /api/users/delete-batch - sequential multi-target deletion with a
/// per-target outcome report.
pub async fn users_delete_batch(
    Extension(session): Extension<SessionState>,
    Json(request): Json<DeletionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let actor = guard::require_rank(&pool, &session, Rank::Commodore).await?;

    let report = deletion::delete_users(identity::provider().as_ref(), &actor, &request).await?;
    Ok(ApiResponse::success(report))
}
