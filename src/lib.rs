pub mod config;
pub mod database;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod rank;
pub mod services;
pub mod session;
