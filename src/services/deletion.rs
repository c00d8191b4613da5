//! Cascading user deletion with audit logging.
//!
//! Each target is processed independently and sequentially; one target's
//! failure never blocks the others, and nothing is retried or rolled back.
//! The local record deletion and the identity-provider account deletion are
//! separately-failable steps: a provider failure is recorded in the audit
//! entry, not thrown. An interrupted cascade also writes its audit entry,
//! carrying the partial per-table scope.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{AuditEntry, User};
use crate::database::{audit, records, users, DatabaseManager};
use crate::error::ApiError;
use crate::identity::{IdentityError, IdentityPort};
use crate::rank::Rank;

/// Literal the caller must echo to confirm a deletion.
pub const CONFIRMATION_TOKEN: &str = "DELETE";

#[derive(Debug, Deserialize)]
pub struct DeletionRequest {
    pub targets: Vec<Uuid>,
    pub reason: String,
    pub confirmation: String,
}

#[derive(Debug, Serialize)]
pub struct TargetOutcome {
    pub user_id: Uuid,
    pub success: bool,
    pub audit_id: Option<Uuid>,
    pub error: Option<String>,
}

impl TargetOutcome {
    fn failure(user_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            user_id,
            success: false,
            audit_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<TargetOutcome>,
}

/// Validate the request shape before touching any target.
pub fn validate_request(request: &DeletionRequest) -> Result<(), ApiError> {
    if request.confirmation != CONFIRMATION_TOKEN {
        return Err(ApiError::validation(
            format!("Confirmation must be the literal \"{}\"", CONFIRMATION_TOKEN),
            None,
        ));
    }
    if request.reason.trim().is_empty() {
        return Err(ApiError::validation("A deletion reason is required", None));
    }
    if request.targets.is_empty() {
        return Err(ApiError::validation("No deletion targets given", None));
    }
    Ok(())
}

/// Per-target breakdown of a batch.
pub fn summarize(outcomes: Vec<TargetOutcome>) -> BatchReport {
    let succeeded = outcomes.iter().filter(|o| o.success).count();
    BatchReport {
        succeeded,
        failed: outcomes.len() - succeeded,
        outcomes,
    }
}

/// Record the provider-deletion step on the audit entry. A provider failure
/// flips the entry to `failed` for manual remediation but does not undo the
/// local deletion.
pub fn apply_provider_result(entry: &mut AuditEntry, result: Result<(), IdentityError>) {
    if let Err(e) = result {
        warn!(
            "Identity account deletion failed for {}: {}",
            entry.auth_ref, e
        );
        entry.mark_failure(e.to_string());
    }
}

/// Whether `acting` may delete `target`. Admirals delete anyone; everyone
/// else stays inside their own organization and must strictly outrank the
/// target.
pub fn deletion_allowed(acting: &User, target: &User) -> Result<(), &'static str> {
    if acting.rank.meets(Rank::Admiral) {
        return Ok(());
    }
    if target.org_slug != acting.org_slug {
        return Err("target outside your organization");
    }
    if target.rank >= acting.rank {
        return Err("target holds equal or higher rank");
    }
    Ok(())
}

/// Delete one or more users, producing one audit entry per removed user and
/// a per-target report.
pub async fn delete_users(
    identity: &dyn IdentityPort,
    acting: &User,
    request: &DeletionRequest,
) -> Result<BatchReport, ApiError> {
    validate_request(request)?;
    let pool = DatabaseManager::main_pool().await.map_err(ApiError::from)?;

    let mut outcomes = Vec::with_capacity(request.targets.len());
    for &target in &request.targets {
        outcomes.push(delete_one(identity, &pool, acting, target, &request.reason).await);
    }
    Ok(summarize(outcomes))
}

async fn delete_one(
    identity: &dyn IdentityPort,
    pool: &PgPool,
    acting: &User,
    target: Uuid,
    reason: &str,
) -> TargetOutcome {
    let user = match users::find_by_id(pool, target).await {
        Ok(Some(user)) => user,
        Ok(None) => return TargetOutcome::failure(target, "user not found"),
        Err(e) => return TargetOutcome::failure(target, e.to_string()),
    };

    if let Err(reason) = deletion_allowed(acting, &user) {
        return TargetOutcome::failure(target, reason);
    }

    let mut entry = AuditEntry::snapshot(&user, acting.id, reason);

    // Cascade owned records first, accumulating per-table counts. A failure
    // mid-cascade still writes the audit entry: rows already removed must
    // leave a persistent record.
    for table in records::CASCADE_TABLES {
        match records::delete_by_creator(pool, table, user.id).await {
            Ok(deleted) => entry.scope.record(table, deleted),
            Err(e) => {
                entry.mark_failure(format!("cascade of {} failed: {}", table, e));
                return persist_failure(pool, target, entry).await;
            }
        }
    }

    match users::delete(pool, user.id).await {
        Ok(true) => {}
        Ok(false) => {
            entry.mark_failure("user row already deleted");
            return persist_failure(pool, target, entry).await;
        }
        Err(e) => {
            entry.mark_failure(format!("user deletion failed: {}", e));
            return persist_failure(pool, target, entry).await;
        }
    }

    // External account removal is separately failable; outcome lands in the
    // audit entry rather than aborting the operation.
    apply_provider_result(&mut entry, identity.delete_account(&user.auth_ref).await);

    match audit::insert(pool, &entry).await {
        Ok(audit_row) => {
            info!(
                "Deleted user {} ({} cascaded rows), audit {}",
                user.id,
                entry.scope.total(),
                audit_row.id
            );
            TargetOutcome {
                user_id: target,
                success: true,
                audit_id: Some(audit_row.id),
                error: entry.error.clone(),
            }
        }
        Err(e) => TargetOutcome::failure(target, format!("audit write failed: {}", e)),
    }
}

/// Write the failed entry with its partial scope so the interrupted cascade
/// stays visible for manual remediation.
async fn persist_failure(pool: &PgPool, target: Uuid, entry: AuditEntry) -> TargetOutcome {
    let error = entry.error.clone();
    match audit::insert(pool, &entry).await {
        Ok(audit_row) => TargetOutcome {
            user_id: target,
            success: false,
            audit_id: Some(audit_row.id),
            error,
        },
        Err(e) => {
            warn!(
                "Audit write failed after partial deletion of {}: {}",
                entry.user_id, e
            );
            TargetOutcome {
                user_id: target,
                success: false,
                audit_id: None,
                error: error.map(|msg| format!("{} (audit write also failed: {})", msg, e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CascadeScope;
    use crate::identity::IdentityProfile;
    use crate::rank::{Rank, SetupStatus, SubscriptionStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use sqlx::types::Json;

    struct MockIdentity {
        fail_deletion: bool,
    }

    #[async_trait]
    impl IdentityPort for MockIdentity {
        async fn verify_assertion(
            &self,
            _assertion: &str,
        ) -> Result<IdentityProfile, IdentityError> {
            unimplemented!("not used in deletion tests")
        }

        async fn send_verification_code(&self, _email: &str) -> Result<(), IdentityError> {
            Ok(())
        }

        async fn verify_code(&self, _email: &str, _code: &str) -> Result<String, IdentityError> {
            unimplemented!("not used in deletion tests")
        }

        async fn change_email(
            &self,
            _auth_ref: &str,
            _new_email: &str,
        ) -> Result<(), IdentityError> {
            Ok(())
        }

        async fn delete_account(&self, _auth_ref: &str) -> Result<(), IdentityError> {
            if self.fail_deletion {
                Err(IdentityError::Provider("upstream 500".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn user_with(rank: Rank, org: Option<&str>) -> User {
        let mut user = sample_user();
        user.rank = rank;
        user.org_slug = org.map(str::to_string);
        user
    }

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            auth_ref: "idp_del".to_string(),
            email: "target@example.com".to_string(),
            name: None,
            rank: Rank::Crew,
            setup_status: SetupStatus::Complete,
            subscription_status: SubscriptionStatus::Active,
            trial_started_at: None,
            trial_ends_at: None,
            org_slug: Some("acme".to_string()),
            theme: "system".to_string(),
            dashboard_widgets: Json(Vec::new()),
            avatar_key: None,
            logo_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(confirmation: &str, reason: &str, targets: Vec<Uuid>) -> DeletionRequest {
        DeletionRequest {
            targets,
            reason: reason.to_string(),
            confirmation: confirmation.to_string(),
        }
    }

    #[test]
    fn rejects_wrong_confirmation_token() {
        let req = request("delete", "cleanup", vec![Uuid::new_v4()]);
        assert!(validate_request(&req).is_err());
    }

    #[test]
    fn rejects_blank_reason_and_empty_targets() {
        let req = request(CONFIRMATION_TOKEN, "   ", vec![Uuid::new_v4()]);
        assert!(validate_request(&req).is_err());

        let req = request(CONFIRMATION_TOKEN, "cleanup", vec![]);
        assert!(validate_request(&req).is_err());
    }

    #[test]
    fn accepts_well_formed_request() {
        let req = request(CONFIRMATION_TOKEN, "offboarding", vec![Uuid::new_v4()]);
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn summary_reports_per_target_breakdown() {
        let ok_a = Uuid::new_v4();
        let bad = Uuid::new_v4();
        let ok_b = Uuid::new_v4();
        let outcomes = vec![
            TargetOutcome {
                user_id: ok_a,
                success: true,
                audit_id: Some(Uuid::new_v4()),
                error: None,
            },
            TargetOutcome::failure(bad, "user not found"),
            TargetOutcome {
                user_id: ok_b,
                success: true,
                audit_id: Some(Uuid::new_v4()),
                error: None,
            },
        ];

        let report = summarize(outcomes);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);

        let failing = report.outcomes.iter().find(|o| !o.success).unwrap();
        assert_eq!(failing.user_id, bad);
        assert_eq!(failing.error.as_deref(), Some("user not found"));
    }

    #[tokio::test]
    async fn provider_failure_is_recorded_not_thrown() {
        let identity = MockIdentity {
            fail_deletion: true,
        };
        let user = sample_user();
        let mut entry = AuditEntry::snapshot(&user, Uuid::new_v4(), "cleanup");

        apply_provider_result(&mut entry, identity.delete_account(&user.auth_ref).await);

        assert_eq!(entry.status, crate::database::models::AuditStatus::Failed);
        assert!(entry.error.as_deref().unwrap().contains("upstream 500"));
    }

    #[tokio::test]
    async fn provider_success_leaves_entry_completed() {
        let identity = MockIdentity {
            fail_deletion: false,
        };
        let user = sample_user();
        let mut entry = AuditEntry::snapshot(&user, Uuid::new_v4(), "cleanup");
        entry.scope = CascadeScope::default();

        apply_provider_result(&mut entry, identity.delete_account(&user.auth_ref).await);

        assert_eq!(
            entry.status,
            crate::database::models::AuditStatus::Completed
        );
        assert!(entry.error.is_none());
    }

    #[test]
    fn interrupted_cascade_marks_entry_failed_with_partial_scope() {
        let user = sample_user();
        let mut entry = AuditEntry::snapshot(&user, Uuid::new_v4(), "cleanup");
        entry.scope.record("projects", 4);
        entry.mark_failure("cascade of clients failed: connection reset");

        assert_eq!(entry.status, crate::database::models::AuditStatus::Failed);
        assert_eq!(entry.scope.total(), 4);
        assert!(entry.error.as_deref().unwrap().contains("clients"));
    }

    #[test]
    fn commodore_deletes_lower_ranks_in_own_org() {
        let acting = user_with(Rank::Commodore, Some("acme"));
        assert!(deletion_allowed(&acting, &user_with(Rank::Crew, Some("acme"))).is_ok());
        assert!(deletion_allowed(&acting, &user_with(Rank::Captain, Some("acme"))).is_ok());
    }

    #[test]
    fn commodore_cannot_delete_equal_or_higher_rank() {
        let acting = user_with(Rank::Commodore, Some("acme"));
        assert!(deletion_allowed(&acting, &user_with(Rank::Commodore, Some("acme"))).is_err());
        assert!(deletion_allowed(&acting, &user_with(Rank::Admiral, Some("acme"))).is_err());
    }

    #[test]
    fn commodore_cannot_cross_organizations() {
        let acting = user_with(Rank::Commodore, Some("acme"));
        assert!(deletion_allowed(&acting, &user_with(Rank::Crew, Some("globex"))).is_err());
        assert!(deletion_allowed(&acting, &user_with(Rank::Crew, None)).is_err());
    }

    #[test]
    fn admiral_deletes_anyone_anywhere() {
        let acting = user_with(Rank::Admiral, None);
        assert!(deletion_allowed(&acting, &user_with(Rank::Admiral, Some("acme"))).is_ok());
        assert!(deletion_allowed(&acting, &user_with(Rank::Crew, Some("globex"))).is_ok());
    }
}
