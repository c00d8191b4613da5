//! Rank-based authorization guard.
//!
//! Every privileged read/write re-derives the caller's identity from the
//! request's session and checks it against the stored user record. The check
//! is read-only, local to the request, and never retried.

use sqlx::PgPool;

use crate::database::models::User;
use crate::database::users;
use crate::error::ApiError;
use crate::rank::Rank;
use crate::session::SessionState;

/// Resolve the caller's stored user record and require a minimum rank.
///
/// Fails `NotFound` when no record exists for the session's auth reference,
/// `Unauthorized` when the record's rank is below `min`. Rank comparison is
/// the fixed four-level ordinal ladder; there is no other policy.
pub async fn require_rank(
    pool: &PgPool,
    session: &SessionState,
    min: Rank,
) -> Result<User, ApiError> {
    let user = users::find_by_auth_ref(pool, &session.auth_ref)
        .await?
        .ok_or_else(|| ApiError::not_found("User record not found"))?;

    if !user.rank.meets(min) {
        return Err(ApiError::unauthorized(format!(
            "Requires rank {} or above",
            min
        )));
    }

    Ok(user)
}

/// Resolve the caller without a rank requirement (self-scoped operations).
pub async fn require_user(pool: &PgPool, session: &SessionState) -> Result<User, ApiError> {
    require_rank(pool, session, Rank::Crew).await
}

/// The organization filter for a reader: admirals see every organization,
/// everyone else is scoped to their own.
pub fn org_filter(user: &User) -> Option<&str> {
    if user.rank.meets(Rank::Admiral) {
        None
    } else {
        user.org_slug.as_deref()
    }
}

/// Whether `actor` may mutate a record owned by `record_org`. Captains and
/// above mutate within their organization; admirals mutate anywhere.
pub fn can_mutate_org_record(actor: &User, record_org: &str) -> bool {
    if actor.rank.meets(Rank::Admiral) {
        return true;
    }
    actor.rank.meets(Rank::Captain) && actor.org_slug.as_deref() == Some(record_org)
}
