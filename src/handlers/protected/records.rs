//! Org-scoped business records: projects, clients, transactions and
//! productivity items. Reads are scoped through the caller's organization
//! filter; mutations of existing records go through the org-mutation rule
//! (captain+ within their organization, admirals anywhere). Creating a
//! record requires the caller to belong to an organization.

use axum::extract::{Path, Query};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{ProductivityKind, User};
use crate::database::{records, DatabaseManager};
use crate::error::ApiError;
use crate::guard;
use crate::middleware::ApiResponse;
use crate::session::SessionState;

#[derive(Debug, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub status: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionUpdate {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ProductivityQuery {
    pub kind: Option<ProductivityKind>,
}

#[derive(Debug, Deserialize)]
pub struct NewProductivityItem {
    pub kind: ProductivityKind,
    pub title: String,
    pub body: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ProductivityUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

async fn actor(pool: &PgPool, session: &SessionState) -> Result<User, ApiError> {
    guard::require_user(pool, session).await
}

/// Creating records requires organization membership; the record inherits
/// the creator's org.
fn require_org(actor: &User) -> Result<&str, ApiError> {
    actor
        .org_slug
        .as_deref()
        .ok_or_else(|| ApiError::validation("Join an organization before creating records", None))
}

fn require_mutation(actor: &User, record_org: &str) -> Result<(), ApiError> {
    if guard::can_mutate_org_record(actor, record_org) {
        Ok(())
    } else {
        Err(ApiError::unauthorized(
            "Requires rank captain or above within the record's organization",
        ))
    }
}

fn require_non_empty(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::validation(message, None))
    } else {
        Ok(())
    }
}

// ---- projects ----

pub async fn projects_list(
    Extension(session): Extension<SessionState>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let projects = records::list_projects(&pool, guard::org_filter(&user)).await?;
    Ok(ApiResponse::success(projects))
}

pub async fn project_post(
    Extension(session): Extension<SessionState>,
    Json(payload): Json<NewProject>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&payload.name, "Project name is required")?;

    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;
    let org = require_org(&user)?;

    let project =
        records::insert_project(&pool, org, user.id, &payload.name, payload.due_at).await?;
    Ok(ApiResponse::created(project))
}

pub async fn project_patch(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjectUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let project = records::find_project(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    require_mutation(&user, &project.org_slug)?;

    let updated = records::update_project(
        &pool,
        id,
        payload.name.as_deref(),
        payload.status.as_deref(),
        payload.due_at,
    )
    .await?;
    Ok(ApiResponse::success(updated))
}

pub async fn project_delete(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let project = records::find_project(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    require_mutation(&user, &project.org_slug)?;

    records::delete_project(&pool, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

// ---- clients ----

pub async fn clients_list(
    Extension(session): Extension<SessionState>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let clients = records::list_clients(&pool, guard::org_filter(&user)).await?;
    Ok(ApiResponse::success(clients))
}

pub async fn client_post(
    Extension(session): Extension<SessionState>,
    Json(payload): Json<NewClient>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&payload.name, "Client name is required")?;

    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;
    let org = require_org(&user)?;

    let client = records::insert_client(
        &pool,
        org,
        user.id,
        &payload.name,
        payload.email.as_deref(),
        payload.company.as_deref(),
    )
    .await?;
    Ok(ApiResponse::created(client))
}

pub async fn client_patch(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let client = records::find_client(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client not found"))?;
    require_mutation(&user, &client.org_slug)?;

    let updated = records::update_client(
        &pool,
        id,
        payload.name.as_deref(),
        payload.email.as_deref(),
        payload.company.as_deref(),
    )
    .await?;
    Ok(ApiResponse::success(updated))
}

pub async fn client_delete(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let client = records::find_client(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client not found"))?;
    require_mutation(&user, &client.org_slug)?;

    records::delete_client(&pool, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

// ---- transactions ----

pub async fn transactions_list(
    Extension(session): Extension<SessionState>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let transactions = records::list_transactions(&pool, guard::org_filter(&user)).await?;
    Ok(ApiResponse::success(transactions))
}

pub async fn transaction_post(
    Extension(session): Extension<SessionState>,
    Json(payload): Json<NewTransaction>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&payload.description, "Transaction description is required")?;

    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;
    let org = require_org(&user)?;

    let transaction = records::insert_transaction(
        &pool,
        org,
        user.id,
        &payload.description,
        payload.amount,
        payload.occurred_at,
    )
    .await?;
    Ok(ApiResponse::created(transaction))
}

pub async fn transaction_patch(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let transaction = records::find_transaction(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;
    require_mutation(&user, &transaction.org_slug)?;

    let updated = records::update_transaction(
        &pool,
        id,
        payload.description.as_deref(),
        payload.amount,
        payload.occurred_at,
    )
    .await?;
    Ok(ApiResponse::success(updated))
}

pub async fn transaction_delete(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let transaction = records::find_transaction(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;
    require_mutation(&user, &transaction.org_slug)?;

    records::delete_transaction(&pool, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

// ---- productivity items ----

pub async fn productivity_list(
    Extension(session): Extension<SessionState>,
    Query(query): Query<ProductivityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let items = records::list_productivity(&pool, guard::org_filter(&user), query.kind).await?;
    Ok(ApiResponse::success(items))
}

pub async fn productivity_post(
    Extension(session): Extension<SessionState>,
    Json(payload): Json<NewProductivityItem>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&payload.title, "Item title is required")?;

    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;
    let org = require_org(&user)?;

    let item = records::insert_productivity(
        &pool,
        org,
        user.id,
        payload.kind,
        &payload.title,
        payload.body.as_deref(),
        payload.starts_at,
        payload.ends_at,
    )
    .await?;
    Ok(ApiResponse::created(item))
}

pub async fn productivity_patch(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductivityUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let item = records::find_productivity(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    require_mutation(&user, &item.org_slug)?;

    let updated = records::update_productivity(
        &pool,
        id,
        payload.title.as_deref(),
        payload.body.as_deref(),
        payload.starts_at,
        payload.ends_at,
    )
    .await?;
    Ok(ApiResponse::success(updated))
}

pub async fn productivity_delete(
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::main_pool().await?;
    let user = actor(&pool, &session).await?;

    let item = records::find_productivity(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    require_mutation(&user, &item.org_slug)?;

    records::delete_productivity(&pool, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
