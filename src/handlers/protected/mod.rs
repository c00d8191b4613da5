pub mod account;
pub mod audit;
pub mod records;
pub mod users;
