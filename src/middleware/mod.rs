pub mod auth;
pub mod response;

pub use auth::session_auth_middleware;
pub use response::{ApiResponse, ApiResult};
