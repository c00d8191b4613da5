//! Session mint service: exchange a verified identity profile for a signed
//! session, creating or refreshing the canonical user record on the way.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::warn;

use crate::config;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, User};
use crate::database::{users, DatabaseManager};
use crate::error::ApiError;
use crate::identity::IdentityProfile;
use crate::rank::{Rank, SubscriptionStatus};
use crate::session::policy::{refresh_rule, Refresh, SessionField};
use crate::session::{self, cookie, SessionClaims};

/// Result of a mint attempt. `degraded` marks the fallback path where the
/// data layer was unreachable and the session was built from the identity
/// assertion alone.
#[derive(Debug)]
pub struct MintOutcome {
    pub claims: SessionClaims,
    pub degraded: bool,
}

/// Mint a session for a verified identity profile.
///
/// Data-layer failures never block login: the session falls back to
/// assertion-only defaults and the error is logged.
pub async fn mint_for_profile(profile: &IdentityProfile) -> MintOutcome {
    match ensure_user(profile).await {
        Ok(user) => MintOutcome {
            claims: SessionClaims::for_user(&user),
            degraded: false,
        },
        Err(e) => {
            warn!("Session mint degraded, using assertion-only fallback: {}", e);
            MintOutcome {
                claims: SessionClaims::fallback(profile),
                degraded: true,
            }
        }
    }
}

/// Read-or-create the canonical user record for an identity profile.
///
/// Idempotent for existing users: setup state, trial timers and profile
/// fields are left untouched; only identity-volatile fields are refreshed
/// from the provider. Trial expiry is evaluated on every login-check.
async fn ensure_user(profile: &IdentityProfile) -> Result<User, DatabaseError> {
    let pool = DatabaseManager::main_pool().await?;

    match users::find_by_auth_ref(&pool, &profile.auth_ref).await? {
        Some(existing) => refresh_existing(&pool, existing, profile).await,
        None => create_with_defaults(&pool, profile).await,
    }
}

async fn refresh_existing(
    pool: &PgPool,
    existing: User,
    profile: &IdentityProfile,
) -> Result<User, DatabaseError> {
    let user = users::refresh_identity(
        pool,
        existing.id,
        &profile.email,
        profile.name.as_deref(),
        profile.avatar_url.as_deref(),
    )
    .await?;

    let config = config::config();
    let grace = Duration::days(config.trial.grace_days);
    match trial_transition(
        user.rank,
        user.subscription_status,
        user.trial_ends_at,
        Utc::now(),
        grace,
    ) {
        Some((rank, status)) => users::apply_demotion(pool, user.id, rank, status).await,
        None => Ok(user),
    }
}

async fn create_with_defaults(
    pool: &PgPool,
    profile: &IdentityProfile,
) -> Result<User, DatabaseError> {
    let now = Utc::now();
    let trial_days = config::config().trial.trial_days;

    let new_user = NewUser {
        auth_ref: profile.auth_ref.clone(),
        email: profile.email.clone(),
        name: profile.name.clone(),
        avatar_key: profile.avatar_url.clone(),
        trial_started_at: now,
        trial_ends_at: now + Duration::days(trial_days),
    };
    users::insert(pool, &new_user).await
}

/// Trial-expiry decision, evaluated at login-check time.
///
/// Returns the demotion to apply, or None when nothing changes:
/// - trial past `trial_ends_at` + grace: demote to Crew, status Expired
/// - trial past `trial_ends_at` but within grace: keep rank, status Expired
/// - anything else: unchanged
pub fn trial_transition(
    rank: Rank,
    status: SubscriptionStatus,
    trial_ends_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    grace: Duration,
) -> Option<(Rank, SubscriptionStatus)> {
    if status != SubscriptionStatus::Trial {
        return None;
    }
    let ends_at = trial_ends_at?;
    if now <= ends_at {
        return None;
    }
    if now <= ends_at + grace {
        Some((rank, SubscriptionStatus::Expired))
    } else {
        Some((Rank::Crew, SubscriptionStatus::Expired))
    }
}

/// Mutate-then-remint helper: given the updated user record and the field
/// that changed, produce the Set-Cookie value when the staleness policy
/// calls for an immediate rewrite.
pub fn remint_cookie(user: &User, field: SessionField) -> Result<Option<String>, ApiError> {
    match refresh_rule(field) {
        Refresh::Immediate => {
            let claims = SessionClaims::for_user(user);
            let token = session::mint(&claims)?;
            Ok(Some(cookie::session_cookie(&token)))
        }
        Refresh::NextLogin => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::SetupStatus;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn days(n: i64) -> Duration {
        Duration::days(n)
    }

    #[test]
    fn expired_trial_outside_grace_demotes_to_crew() {
        let now = Utc::now();
        let transition = trial_transition(
            Rank::Commodore,
            SubscriptionStatus::Trial,
            Some(now - days(10)),
            now,
            days(3),
        );
        assert_eq!(transition, Some((Rank::Crew, SubscriptionStatus::Expired)));
    }

    #[test]
    fn expired_trial_within_grace_keeps_rank() {
        let now = Utc::now();
        let transition = trial_transition(
            Rank::Commodore,
            SubscriptionStatus::Trial,
            Some(now - days(2)),
            now,
            days(3),
        );
        assert_eq!(
            transition,
            Some((Rank::Commodore, SubscriptionStatus::Expired))
        );
    }

    #[test]
    fn active_trial_is_untouched() {
        let now = Utc::now();
        let transition = trial_transition(
            Rank::Captain,
            SubscriptionStatus::Trial,
            Some(now + days(5)),
            now,
            days(3),
        );
        assert_eq!(transition, None);
    }

    #[test]
    fn non_trial_subscriptions_never_transition() {
        let now = Utc::now();
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::Lifetime,
            SubscriptionStatus::Expired,
            SubscriptionStatus::Cancelled,
        ] {
            assert_eq!(
                trial_transition(Rank::Admiral, status, Some(now - days(30)), now, days(3)),
                None
            );
        }
    }

    #[test]
    fn trial_without_end_date_is_untouched() {
        let now = Utc::now();
        assert_eq!(
            trial_transition(Rank::Crew, SubscriptionStatus::Trial, None, now, days(3)),
            None
        );
    }

    fn sample_user(theme: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            auth_ref: "idp_7".to_string(),
            email: "user@example.com".to_string(),
            name: None,
            rank: Rank::Crew,
            setup_status: SetupStatus::Complete,
            subscription_status: SubscriptionStatus::Active,
            trial_started_at: None,
            trial_ends_at: None,
            org_slug: None,
            theme: theme.to_string(),
            dashboard_widgets: Json(Vec::new()),
            avatar_key: None,
            logo_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn theme_updates_do_not_rewrite_the_cookie() {
        let user = sample_user("dark");
        let cookie = remint_cookie(&user, SessionField::Theme).unwrap();
        assert!(cookie.is_none());
    }

    #[test]
    fn profile_updates_rewrite_the_cookie() {
        let user = sample_user("system");
        let cookie = remint_cookie(&user, SessionField::Profile).unwrap();
        let cookie = cookie.expect("profile change re-mints immediately");
        assert!(cookie.starts_with("fuse_session="));
    }
}
