pub mod audit;
pub mod record;
pub mod user;

pub use audit::{AuditEntry, AuditStatus, CascadeScope, DeletionAudit};
pub use record::{Client, ProductivityItem, ProductivityKind, Project, Transaction};
pub use user::{NewUser, User};
