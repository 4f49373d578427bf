//! Best-effort bank transaction matching
//!
//! Matches imported bank records to obligations by settlement reference.
//! Matching is advisory: it links records to obligations so a human can see
//! which payments have arrived, but it never transitions an obligation to
//! paid. That remains a separate, explicit, authorized action.

use std::sync::Arc;

use tracing::{debug, info};

use domain_settlement::{SettlementStore, StoreError};

use crate::ports::BankImportStore;
use crate::record::BankTransactionRecord;

/// Matches imported bank records against obligation settlement references
pub struct BankMatcher<S> {
    store: Arc<S>,
}

impl<S: SettlementStore + BankImportStore> BankMatcher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Stores an imported record and attempts to match it immediately
    ///
    /// Returns the record as persisted, matched or not.
    pub async fn import(
        &self,
        record: BankTransactionRecord,
    ) -> Result<BankTransactionRecord, StoreError> {
        self.store.insert_record(record.clone()).await?;
        self.try_match(record).await
    }

    /// Re-runs matching over every record still unmatched
    ///
    /// Useful after new purchases are recorded: references that had no
    /// obligation at import time may resolve now. Returns how many records
    /// were matched by this sweep.
    pub async fn rematch_unmatched(&self) -> Result<usize, StoreError> {
        let pending = self.store.unmatched_records().await?;
        let mut matched = 0;
        for record in pending {
            if self.try_match(record).await?.matched {
                matched += 1;
            }
        }
        if matched > 0 {
            info!(matched, "Rematch sweep linked bank records");
        }
        Ok(matched)
    }

    /// Attempts to find exactly one obligation referenced by the record text
    ///
    /// No guessing: an absent reference leaves the record unmatched, and so
    /// does an ambiguous one (two or more candidate obligations).
    async fn try_match(
        &self,
        mut record: BankTransactionRecord,
    ) -> Result<BankTransactionRecord, StoreError> {
        let candidates = self
            .store
            .obligations_referenced_in(&record.reference_text)
            .await?;

        match candidates.as_slice() {
            [only] => {
                self.store.mark_matched(record.id, only.id).await?;
                record.link(only.id);
                info!(
                    record_id = %record.id,
                    obligation_id = %only.id,
                    reference = %only.reference,
                    "Bank record matched"
                );
            }
            [] => {
                debug!(record_id = %record.id, "No settlement reference found in bank record");
            }
            many => {
                debug!(
                    record_id = %record.id,
                    candidates = many.len(),
                    "Ambiguous bank record left unmatched"
                );
            }
        }

        Ok(record)
    }
}
