//! Deletion audit log. Entries are immutable once written; the only admin
//! operation besides reading is admiral-gated housekeeping removal.

use axum::extract::Path;
use axum::Extension;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::DeletionAudit;
use crate::database::{audit, DatabaseManager};
use crate::error::ApiError;
use crate::guard;
use crate::middleware::{ApiResponse, ApiResult};
use crate::rank::Rank;
use crate::session::SessionState;

/// GET /api/audit - commodore+ view of the deletion log, newest first.
pub async fn audit_list(
    Extension(session): Extension<SessionState>,
) -> ApiResult<Vec<DeletionAudit>> {
    let pool = DatabaseManager::main_pool().await?;
    guard::require_rank(&pool, &session, Rank::Commodore).await?;

    let entries = audit::list(&pool).await?;
    Ok(ApiResponse::success(entries))
}

/// DELETE /api/audit/:id - admiral-only removal of a single entry.
pub async fn audit_delete(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::main_pool().await?;
    guard::require_rank(&pool, &session, Rank::Admiral).await?;

    if !audit::delete(&pool, id).await? {
        return Err(ApiError::not_found("Audit entry not found"));
    }
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
