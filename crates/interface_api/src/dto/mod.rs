//! Request/response data transfer objects

pub mod bank;
pub mod purchase;
