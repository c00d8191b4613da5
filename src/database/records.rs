use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Client, ProductivityItem, ProductivityKind, Project, Transaction};

/// Tables cascaded when a user is deleted, in deletion order.
pub const CASCADE_TABLES: &[&str] = &["projects", "clients", "transactions", "productivity_items"];

/// Delete all rows in one cascade table created by the given user,
/// returning the deleted count for the audit scope.
pub async fn delete_by_creator(
    pool: &PgPool,
    table: &str,
    created_by: Uuid,
) -> Result<i64, DatabaseError> {
    // Table names come from CASCADE_TABLES, never from request input.
    debug_assert!(CASCADE_TABLES.contains(&table));
    let query = format!("DELETE FROM {} WHERE created_by = $1", table);
    let result = sqlx::query(&query).bind(created_by).execute(pool).await?;
    Ok(result.rows_affected() as i64)
}

// ---- projects ----

pub async fn list_projects(
    pool: &PgPool,
    org_slug: Option<&str>,
) -> Result<Vec<Project>, DatabaseError> {
    let rows = match org_slug {
        Some(org) => {
            sqlx::query_as::<_, Project>(
                "SELECT * FROM projects WHERE org_slug = $1 ORDER BY created_at DESC",
            )
            .bind(org)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

pub async fn find_project(pool: &PgPool, id: Uuid) -> Result<Option<Project>, DatabaseError> {
    let row = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn insert_project(
    pool: &PgPool,
    org_slug: &str,
    created_by: Uuid,
    name: &str,
    due_at: Option<DateTime<Utc>>,
) -> Result<Project, DatabaseError> {
    let row = sqlx::query_as::<_, Project>(
        "INSERT INTO projects (org_slug, created_by, name, due_at)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(org_slug)
    .bind(created_by)
    .bind(name)
    .bind(due_at)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_project(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    status: Option<&str>,
    due_at: Option<DateTime<Utc>>,
) -> Result<Project, DatabaseError> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET name = COALESCE($2, name),
             status = COALESCE($3, status),
             due_at = COALESCE($4, due_at),
             updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(status)
    .bind(due_at)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("project not found".to_string()))
}

pub async fn delete_project(pool: &PgPool, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---- clients ----

pub async fn list_clients(
    pool: &PgPool,
    org_slug: Option<&str>,
) -> Result<Vec<Client>, DatabaseError> {
    let rows = match org_slug {
        Some(org) => {
            sqlx::query_as::<_, Client>(
                "SELECT * FROM clients WHERE org_slug = $1 ORDER BY name",
            )
            .bind(org)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY name")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

pub async fn find_client(pool: &PgPool, id: Uuid) -> Result<Option<Client>, DatabaseError> {
    let row = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn insert_client(
    pool: &PgPool,
    org_slug: &str,
    created_by: Uuid,
    name: &str,
    email: Option<&str>,
    company: Option<&str>,
) -> Result<Client, DatabaseError> {
    let row = sqlx::query_as::<_, Client>(
        "INSERT INTO clients (org_slug, created_by, name, email, company)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(org_slug)
    .bind(created_by)
    .bind(name)
    .bind(email)
    .bind(company)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_client(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
    company: Option<&str>,
) -> Result<Client, DatabaseError> {
    sqlx::query_as::<_, Client>(
        "UPDATE clients
         SET name = COALESCE($2, name),
             email = COALESCE($3, email),
             company = COALESCE($4, company),
             updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(company)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("client not found".to_string()))
}

pub async fn delete_client(pool: &PgPool, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---- transactions ----

pub async fn list_transactions(
    pool: &PgPool,
    org_slug: Option<&str>,
) -> Result<Vec<Transaction>, DatabaseError> {
    let rows = match org_slug {
        Some(org) => {
            sqlx::query_as::<_, Transaction>(
                "SELECT * FROM transactions WHERE org_slug = $1 ORDER BY occurred_at DESC",
            )
            .bind(org)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Transaction>(
                "SELECT * FROM transactions ORDER BY occurred_at DESC",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

pub async fn find_transaction(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Transaction>, DatabaseError> {
    let row = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn insert_transaction(
    pool: &PgPool,
    org_slug: &str,
    created_by: Uuid,
    description: &str,
    amount: Decimal,
    occurred_at: Option<DateTime<Utc>>,
) -> Result<Transaction, DatabaseError> {
    let row = sqlx::query_as::<_, Transaction>(
        "INSERT INTO transactions (org_slug, created_by, description, amount, occurred_at)
         VALUES ($1, $2, $3, $4, COALESCE($5, now())) RETURNING *",
    )
    .bind(org_slug)
    .bind(created_by)
    .bind(description)
    .bind(amount)
    .bind(occurred_at)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_transaction(
    pool: &PgPool,
    id: Uuid,
    description: Option<&str>,
    amount: Option<Decimal>,
    occurred_at: Option<DateTime<Utc>>,
) -> Result<Transaction, DatabaseError> {
    sqlx::query_as::<_, Transaction>(
        "UPDATE transactions
         SET description = COALESCE($2, description),
             amount = COALESCE($3, amount),
             occurred_at = COALESCE($4, occurred_at)
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(description)
    .bind(amount)
    .bind(occurred_at)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("transaction not found".to_string()))
}

pub async fn delete_transaction(pool: &PgPool, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---- productivity items (emails / calendar events / bookings / meetings) ----

pub async fn list_productivity(
    pool: &PgPool,
    org_slug: Option<&str>,
    kind: Option<ProductivityKind>,
) -> Result<Vec<ProductivityItem>, DatabaseError> {
    let rows = match (org_slug, kind) {
        (Some(org), Some(kind)) => {
            sqlx::query_as::<_, ProductivityItem>(
                "SELECT * FROM productivity_items
                 WHERE org_slug = $1 AND kind = $2 ORDER BY created_at DESC",
            )
            .bind(org)
            .bind(kind)
            .fetch_all(pool)
            .await?
        }
        (Some(org), None) => {
            sqlx::query_as::<_, ProductivityItem>(
                "SELECT * FROM productivity_items WHERE org_slug = $1 ORDER BY created_at DESC",
            )
            .bind(org)
            .fetch_all(pool)
            .await?
        }
        (None, Some(kind)) => {
            sqlx::query_as::<_, ProductivityItem>(
                "SELECT * FROM productivity_items WHERE kind = $1 ORDER BY created_at DESC",
            )
            .bind(kind)
            .fetch_all(pool)
            .await?
        }
        (None, None) => {
            sqlx::query_as::<_, ProductivityItem>(
                "SELECT * FROM productivity_items ORDER BY created_at DESC",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

pub async fn find_productivity(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ProductivityItem>, DatabaseError> {
    let row = sqlx::query_as::<_, ProductivityItem>(
        "SELECT * FROM productivity_items WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_productivity(
    pool: &PgPool,
    org_slug: &str,
    created_by: Uuid,
    kind: ProductivityKind,
    title: &str,
    body: Option<&str>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<ProductivityItem, DatabaseError> {
    let row = sqlx::query_as::<_, ProductivityItem>(
        "INSERT INTO productivity_items
            (org_slug, created_by, kind, title, body, starts_at, ends_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(org_slug)
    .bind(created_by)
    .bind(kind)
    .bind(title)
    .bind(body)
    .bind(starts_at)
    .bind(ends_at)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_productivity(
    pool: &PgPool,
    id: Uuid,
    title: Option<&str>,
    body: Option<&str>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<ProductivityItem, DatabaseError> {
    sqlx::query_as::<_, ProductivityItem>(
        "UPDATE productivity_items
         SET title = COALESCE($2, title),
             body = COALESCE($3, body),
             starts_at = COALESCE($4, starts_at),
             ends_at = COALESCE($5, ends_at),
             updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(title)
    .bind(body)
    .bind(starts_at)
    .bind(ends_at)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound("item not found".to_string()))
}

pub async fn delete_productivity(pool: &PgPool, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM productivity_items WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
