use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{AuditEntry, DeletionAudit};

/// Append one audit entry. Entries are never updated afterward.
pub async fn insert(pool: &PgPool, entry: &AuditEntry) -> Result<DeletionAudit, DatabaseError> {
    let audit = sqlx::query_as::<_, DeletionAudit>(
        "INSERT INTO deletion_audit
            (user_id, auth_ref, email, name, rank, subscription_status, org_slug,
             deleted_by, reason, scope, error, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING *",
    )
    .bind(entry.user_id)
    .bind(&entry.auth_ref)
    .bind(&entry.email)
    .bind(&entry.name)
    .bind(entry.rank)
    .bind(entry.subscription_status)
    .bind(&entry.org_slug)
    .bind(entry.deleted_by)
    .bind(&entry.reason)
    .bind(Json(entry.scope.clone()))
    .bind(&entry.error)
    .bind(entry.status)
    .fetch_one(pool)
    .await?;
    Ok(audit)
}

pub async fn list(pool: &PgPool) -> Result<Vec<DeletionAudit>, DatabaseError> {
    let entries = sqlx::query_as::<_, DeletionAudit>(
        "SELECT * FROM deletion_audit ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Audit-log housekeeping. Gated to admirals at the handler layer.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM deletion_audit WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
