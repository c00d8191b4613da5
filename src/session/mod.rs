//! Session mint and hydrate. A session is a signed, client-readable token
//! (three dot-separated segments, base64 JSON payload) carrying a
//! denormalized snapshot of exactly the fields a client needs for first
//! paint. It is minted at login, rewritten by specific mutations per
//! [`policy::refresh_rule`], and discarded at logout.

pub mod cookie;
pub mod policy;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::database::models::User;
use crate::identity::IdentityProfile;
use crate::rank::{Rank, SetupStatus, SubscriptionStatus};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session secret not configured")]
    MissingSecret,

    #[error("Session encode error: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("Invalid session token: {0}")]
    Invalid(String),
}

/// Signed session payload. Everything a client needs before first paint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User record id; nil when minted on the degraded path
    pub sub: Uuid,
    pub auth_ref: String,
    pub email: String,
    pub name: Option<String>,
    pub rank: Rank,
    pub setup_status: SetupStatus,
    pub subscription_status: SubscriptionStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub org_slug: Option<String>,
    pub theme: String,
    pub widgets: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    /// Snapshot a canonical user record into a session payload.
    pub fn for_user(user: &User) -> Self {
        let now = Utc::now();
        let ttl = config::config().session.ttl_hours;

        Self {
            sub: user.id,
            auth_ref: user.auth_ref.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            rank: user.rank,
            setup_status: user.setup_status,
            subscription_status: user.subscription_status,
            trial_ends_at: user.trial_ends_at,
            org_slug: user.org_slug.clone(),
            theme: user.theme.clone(),
            widgets: user.dashboard_widgets.0.clone(),
            exp: (now + Duration::hours(ttl as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Degraded-path payload built from the identity assertion alone, with
    /// fallback defaults. Used when the user-record lookup or creation
    /// fails, so a data-layer outage never blocks login.
    pub fn fallback(profile: &IdentityProfile) -> Self {
        let now = Utc::now();
        let config = config::config();
        let trial_ends = now + Duration::days(config.trial.trial_days);

        Self {
            sub: Uuid::nil(),
            auth_ref: profile.auth_ref.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            rank: Rank::Crew,
            setup_status: SetupStatus::Pending,
            subscription_status: SubscriptionStatus::Trial,
            trial_ends_at: Some(trial_ends),
            org_slug: None,
            theme: "system".to_string(),
            widgets: Vec::new(),
            exp: (now + Duration::hours(config.session.ttl_hours as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Sign a session payload into a compact token.
pub fn mint(claims: &SessionClaims) -> Result<String, SessionError> {
    let secret = &config::config().session.secret;

    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(SessionError::Encode)
}

/// Decode and verify a session token. Expired or tampered tokens fail.
pub fn decode_token(token: &str) -> Result<SessionClaims, SessionError> {
    let secret = &config::config().session.secret;

    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<SessionClaims>(token, &decoding_key, &Validation::default())
        .map_err(|e| SessionError::Invalid(e.to_string()))?;

    Ok(token_data.claims)
}

/// Typed application session, hydrated from the decoded cookie in one
/// explicit step before handlers run. Handlers read this instead of
/// re-fetching user state per request.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub user_id: Uuid,
    pub auth_ref: String,
    pub email: String,
    pub name: Option<String>,
    pub rank: Rank,
    pub setup_status: SetupStatus,
    pub subscription_status: SubscriptionStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub org_slug: Option<String>,
    pub theme: String,
    pub widgets: Vec<String>,
}

impl SessionState {
    pub fn hydrate(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            auth_ref: claims.auth_ref,
            email: claims.email,
            name: claims.name,
            rank: claims.rank,
            setup_status: claims.setup_status,
            subscription_status: claims.subscription_status,
            trial_ends_at: claims.trial_ends_at,
            org_slug: claims.org_slug,
            theme: claims.theme,
            widgets: claims.widgets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            auth_ref: "idp_42".to_string(),
            email: "captain@example.com".to_string(),
            name: Some("Captain".to_string()),
            rank: Rank::Captain,
            setup_status: SetupStatus::Complete,
            subscription_status: SubscriptionStatus::Active,
            trial_started_at: None,
            trial_ends_at: None,
            org_slug: Some("acme".to_string()),
            theme: "dark".to_string(),
            dashboard_widgets: Json(vec!["inbox".to_string(), "calendar".to_string()]),
            avatar_key: None,
            logo_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_profile() -> IdentityProfile {
        IdentityProfile {
            auth_ref: "idp_99".to_string(),
            email: "new@example.com".to_string(),
            name: None,
            avatar_url: None,
        }
    }

    #[test]
    fn mint_produces_three_dot_separated_segments() {
        let claims = SessionClaims::for_user(&sample_user());
        let token = mint(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn payload_segment_is_base64_decodable_json() {
        use base64_segment::decode_segment;

        let claims = SessionClaims::for_user(&sample_user());
        let token = mint(&claims).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let value = decode_segment(payload);
        assert_eq!(value["email"], "captain@example.com");
        assert_eq!(value["rank"], "captain");
    }

    #[test]
    fn decode_round_trips_the_snapshot() {
        let user = sample_user();
        let claims = SessionClaims::for_user(&user);
        let token = mint(&claims).unwrap();
        let decoded = decode_token(&token).unwrap();

        assert_eq!(decoded.sub, user.id);
        assert_eq!(decoded.auth_ref, "idp_42");
        assert_eq!(decoded.rank, Rank::Captain);
        assert_eq!(decoded.widgets, vec!["inbox", "calendar"]);
    }

    #[test]
    fn decode_rejects_tampered_tokens() {
        let claims = SessionClaims::for_user(&sample_user());
        let mut token = mint(&claims).unwrap();
        token.push('x');
        assert!(matches!(
            decode_token(&token),
            Err(SessionError::Invalid(_))
        ));
    }

    #[test]
    fn fallback_session_uses_crew_trial_defaults() {
        let claims = SessionClaims::fallback(&sample_profile());
        assert_eq!(claims.sub, Uuid::nil());
        assert_eq!(claims.rank, Rank::Crew);
        assert_eq!(claims.subscription_status, SubscriptionStatus::Trial);
        assert_eq!(claims.setup_status, SetupStatus::Pending);
        assert!(claims.trial_ends_at.unwrap() > Utc::now());
    }

    #[test]
    fn hydrate_carries_every_first_paint_field() {
        let user = sample_user();
        let state = SessionState::hydrate(SessionClaims::for_user(&user));
        assert_eq!(state.user_id, user.id);
        assert_eq!(state.theme, "dark");
        assert_eq!(state.org_slug.as_deref(), Some("acme"));
        assert_eq!(state.widgets.len(), 2);
    }

    // Minimal URL-safe base64 decoding for asserting on the raw payload
    // segment without pulling in a base64 dependency.
    mod base64_segment {
        pub fn decode_segment(segment: &str) -> serde_json::Value {
            const ALPHABET: &[u8] =
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
            let index = |c: u8| ALPHABET.iter().position(|&a| a == c).unwrap() as u32;

            let mut bytes = Vec::new();
            for chunk in segment.as_bytes().chunks(4) {
                let mut acc = 0u32;
                for (i, &c) in chunk.iter().enumerate() {
                    acc |= index(c) << (18 - 6 * i);
                }
                let out = [(acc >> 16) as u8, (acc >> 8) as u8, acc as u8];
                bytes.extend_from_slice(&out[..chunk.len() - 1]);
            }
            serde_json::from_slice(&bytes).unwrap()
        }
    }
}
