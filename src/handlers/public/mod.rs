pub mod session;
pub mod sign_in;
