//! Core Kernel - Foundational types for the brewledger system
//!
//! This crate provides the fundamental building blocks used across all domain
//! modules:
//! - Money types with exact minor-unit decimal arithmetic
//! - Strongly-typed identifiers

pub mod identifiers;
pub mod money;

pub use identifiers::{BankRecordId, GroupId, LedgerId, ObligationId, ParticipantId};
pub use money::{Currency, Money, MoneyError};
