use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Organization-scoped business records. Every row carries the owning
/// organization and the creating user; visibility and mutation rights are
/// filtered by the caller's rank and organization match.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub org_slug: String,
    pub created_by: Uuid,
    pub name: String,
    pub status: String,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub org_slug: String,
    pub created_by: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub org_slug: String,
    pub created_by: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "productivity_kind", rename_all = "snake_case")]
pub enum ProductivityKind {
    Email,
    CalendarEvent,
    Booking,
    Meeting,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductivityItem {
    pub id: Uuid,
    pub org_slug: String,
    pub created_by: Uuid,
    pub kind: ProductivityKind,
    pub title: String,
    pub body: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
