//! Request handlers

pub mod bank;
pub mod health;
pub mod obligations;
pub mod purchases;
