pub mod audit;
pub mod manager;
pub mod models;
pub mod records;
pub mod users;

pub use manager::{DatabaseError, DatabaseManager};
