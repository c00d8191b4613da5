pub mod deletion;
pub mod session;
