//! Settlement domain errors

use core_kernel::MoneyError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the settlement domain
///
/// Validation errors are caller mistakes and are reported synchronously.
/// `SplitIntegrity` and `InvariantDrift` are internal integrity violations:
/// they indicate a bug and must surface loudly rather than be corrected.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Money operation failed
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Caller supplied an invalid amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Split requested with no participants
    #[error("Cannot split a purchase among zero participants")]
    EmptyParticipants,

    /// Split result does not sum back to the total. Internal bug; fatal.
    #[error("Split integrity violation: shares sum to {actual}, expected {expected}")]
    SplitIntegrity { expected: Decimal, actual: Decimal },

    /// Obligation is already settled. Benign for idempotent callers.
    #[error("Obligation is already paid")]
    AlreadyPaid,

    /// Requested state transition is not a legal edge
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Cached ledger totals disagree with the obligations. Internal bug; fatal.
    #[error("Ledger invariant drift: cached collected total {cached}, recomputed {recomputed}")]
    InvariantDrift { cached: Decimal, recomputed: Decimal },

    /// General validation failure
    #[error("Validation error: {0}")]
    Validation(String),
}

impl SettlementError {
    pub fn validation(message: impl Into<String>) -> Self {
        SettlementError::Validation(message.into())
    }

    pub fn invalid_amount(message: impl Into<String>) -> Self {
        SettlementError::InvalidAmount(message.into())
    }

    /// True for conditions that indicate an internal bug rather than bad input
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            SettlementError::SplitIntegrity { .. } | SettlementError::InvariantDrift { .. }
        )
    }
}
