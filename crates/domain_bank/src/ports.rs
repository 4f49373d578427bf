//! Bank-import store port
//!
//! Persistence surface for imported bank records, implemented by the same
//! adapters that implement the settlement store.

use async_trait::async_trait;
use core_kernel::{BankRecordId, ObligationId};
use domain_settlement::StoreError;

use crate::record::BankTransactionRecord;

/// Persistence port for imported bank transaction records
#[async_trait]
pub trait BankImportStore: Send + Sync {
    /// Stores an imported record
    ///
    /// A duplicate external transaction id is a `Conflict`; imports are
    /// expected to be re-runnable and duplicates must not multiply records.
    async fn insert_record(&self, record: BankTransactionRecord) -> Result<(), StoreError>;

    /// Fetches one record
    async fn record(&self, id: BankRecordId) -> Result<BankTransactionRecord, StoreError>;

    /// Persists the matched state of a record
    async fn mark_matched(
        &self,
        id: BankRecordId,
        obligation: ObligationId,
    ) -> Result<(), StoreError>;

    /// All records still waiting for a match
    async fn unmatched_records(&self) -> Result<Vec<BankTransactionRecord>, StoreError>;
}
