pub mod account_service;
pub mod auth;
pub mod user_service;
