use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::rank::{Rank, SetupStatus, SubscriptionStatus};

/// Canonical user record. `auth_ref` and `email` are each unique across all
/// users; both constraints live in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    /// External identity-provider reference
    pub auth_ref: String,
    pub email: String,
    pub name: Option<String>,
    pub rank: Rank,
    pub setup_status: SetupStatus,
    pub subscription_status: SubscriptionStatus,
    pub trial_started_at: Option<DateTime<Utc>>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub org_slug: Option<String>,
    pub theme: String,
    pub dashboard_widgets: Json<Vec<String>>,
    pub avatar_key: Option<String>,
    pub logo_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for first-login user creation. Rank, setup and subscription state
/// come from database defaults; the trial window is stamped by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub auth_ref: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_key: Option<String>,
    pub trial_started_at: DateTime<Utc>,
    pub trial_ends_at: DateTime<Utc>,
}
