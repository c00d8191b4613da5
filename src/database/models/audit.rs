use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::database::models::user::User;
use crate::rank::{Rank, SubscriptionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "audit_status", rename_all = "lowercase")]
pub enum AuditStatus {
    /// Cascade, local record and identity-provider account all removed
    Completed,
    /// Some step failed; left for manual remediation, never retried
    /// automatically. The error field says which step.
    Failed,
}

/// Which related tables were cascaded, with per-table row counts. Appended
/// to incrementally as the cascade progresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeScope {
    pub tables: BTreeMap<String, i64>,
}

impl CascadeScope {
    pub fn record(&mut self, table: &str, deleted: i64) {
        self.tables.insert(table.to_string(), deleted);
    }

    pub fn total(&self) -> i64 {
        self.tables.values().sum()
    }
}

/// Immutable snapshot of a deleted user. Created only as a side effect of
/// user deletion; never mutated; deletable only by an admiral.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeletionAudit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub auth_ref: String,
    pub email: String,
    pub name: Option<String>,
    pub rank: Rank,
    pub subscription_status: SubscriptionStatus,
    pub org_slug: Option<String>,
    /// Acting admin
    pub deleted_by: Uuid,
    pub reason: String,
    pub scope: Json<CascadeScope>,
    /// Error from whichever deletion step failed, if any
    pub error: Option<String>,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
}

/// Pre-deletion snapshot assembled in memory before any rows are removed.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Uuid,
    pub auth_ref: String,
    pub email: String,
    pub name: Option<String>,
    pub rank: Rank,
    pub subscription_status: SubscriptionStatus,
    pub org_slug: Option<String>,
    pub deleted_by: Uuid,
    pub reason: String,
    pub scope: CascadeScope,
    pub error: Option<String>,
    pub status: AuditStatus,
}

impl AuditEntry {
    /// Snapshot the target before deletion. Scope and outcome fields are
    /// filled in as the cascade progresses.
    pub fn snapshot(target: &User, acting_admin: Uuid, reason: &str) -> Self {
        Self {
            user_id: target.id,
            auth_ref: target.auth_ref.clone(),
            email: target.email.clone(),
            name: target.name.clone(),
            rank: target.rank,
            subscription_status: target.subscription_status,
            org_slug: target.org_slug.clone(),
            deleted_by: acting_admin,
            reason: reason.to_string(),
            scope: CascadeScope::default(),
            error: None,
            status: AuditStatus::Completed,
        }
    }

    /// Flag the entry as failed, keeping whatever scope accumulated so far.
    pub fn mark_failure(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.status = AuditStatus::Failed;
    }
}
