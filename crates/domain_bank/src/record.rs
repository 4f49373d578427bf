//! Imported bank transaction records
//!
//! These records are produced by an external import step; the core only reads
//! them to attempt reference matching, and mutates nothing beyond the matched
//! state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BankRecordId, Money, ObligationId};

/// One externally-imported bank transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransactionRecord {
    /// Unique identifier
    pub id: BankRecordId,
    /// External transaction id from the bank export (unique)
    pub external_id: String,
    /// Transaction amount as reported by the bank
    pub amount: Money,
    /// Free-text field that may carry a settlement reference
    pub reference_text: String,
    /// Transaction date
    pub transacted_on: NaiveDate,
    /// Linked obligation once matched
    pub matched_obligation: Option<ObligationId>,
    /// Whether this record has been matched
    pub matched: bool,
    /// When the record was imported
    pub imported_at: DateTime<Utc>,
}

impl BankTransactionRecord {
    /// Creates a fresh, unmatched record from imported data
    pub fn imported(
        external_id: impl Into<String>,
        amount: Money,
        reference_text: impl Into<String>,
        transacted_on: NaiveDate,
    ) -> Self {
        Self {
            id: BankRecordId::new_v7(),
            external_id: external_id.into(),
            amount,
            reference_text: reference_text.into(),
            transacted_on,
            matched_obligation: None,
            matched: false,
            imported_at: Utc::now(),
        }
    }

    /// Links this record to the obligation its reference text identified
    ///
    /// Advisory data only: linking never transitions the obligation.
    pub fn link(&mut self, obligation: ObligationId) {
        self.matched_obligation = Some(obligation);
        self.matched = true;
    }
}
