//! In-memory store adapter
//!
//! Backs the settlement and bank-import ports with plain hash maps. The
//! settle contract's row locks become per-entity async mutexes: an obligation
//! lock is taken first, then (when collected funds change) the ledger lock.
//! That ordering is deadlock-free here because every unit of work touches at
//! most one obligation and one ledger. Mutations are prepared on clones and
//! written back only at the end, so any failure rolls back by simply
//! dropping the copies.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use core_kernel::{BankRecordId, LedgerId, ObligationId};
use domain_bank::{BankImportStore, BankTransactionRecord};
use domain_settlement::{
    PaymentObligation, PurchaseLedger, SettlementAction, SettlementOutcome, SettlementStore,
    StoreError,
};

use crate::locks::EntityLocks;

#[derive(Debug, Default)]
struct Tables {
    ledgers: HashMap<LedgerId, PurchaseLedger>,
    obligations: HashMap<ObligationId, PaymentObligation>,
    bank_records: HashMap<BankRecordId, BankTransactionRecord>,
}

/// Embedded store for tests, demos, and single-process deployments
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    entity_locks: EntityLocks,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettlementStore for MemoryStore {
    async fn create_ledger(
        &self,
        ledger: PurchaseLedger,
        obligations: Vec<PaymentObligation>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        if tables.ledgers.contains_key(&ledger.id) {
            return Err(StoreError::Conflict(format!(
                "ledger {} already exists",
                ledger.id
            )));
        }
        // one obligation per (ledger, participant)
        let mut participants = Vec::with_capacity(obligations.len());
        for obligation in &obligations {
            if obligation.ledger_id != ledger.id {
                return Err(StoreError::Conflict(format!(
                    "obligation {} does not belong to ledger {}",
                    obligation.id, ledger.id
                )));
            }
            if participants.contains(&obligation.participant) {
                return Err(StoreError::Conflict(format!(
                    "participant {} appears twice in ledger {}",
                    obligation.participant, ledger.id
                )));
            }
            participants.push(obligation.participant);
        }

        tables.ledgers.insert(ledger.id, ledger);
        for obligation in obligations {
            tables.obligations.insert(obligation.id, obligation);
        }
        Ok(())
    }

    async fn ledger(&self, id: LedgerId) -> Result<PurchaseLedger, StoreError> {
        self.tables
            .read()
            .await
            .ledgers
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("ledger", id))
    }

    async fn obligation(&self, id: ObligationId) -> Result<PaymentObligation, StoreError> {
        self.tables
            .read()
            .await
            .obligations
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("obligation", id))
    }

    async fn obligations_for_ledger(
        &self,
        id: LedgerId,
    ) -> Result<Vec<PaymentObligation>, StoreError> {
        let tables = self.tables.read().await;
        let mut obligations: Vec<PaymentObligation> = tables
            .obligations
            .values()
            .filter(|o| o.ledger_id == id)
            .cloned()
            .collect();
        obligations.sort_by_key(|o| o.created_at);
        Ok(obligations)
    }

    async fn ledger_with_obligations(
        &self,
        id: LedgerId,
    ) -> Result<(PurchaseLedger, Vec<PaymentObligation>), StoreError> {
        // Single read guard so both entities come from the same snapshot.
        let tables = self.tables.read().await;
        let ledger = tables
            .ledgers
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("ledger", id))?;
        let mut obligations: Vec<PaymentObligation> = tables
            .obligations
            .values()
            .filter(|o| o.ledger_id == id)
            .cloned()
            .collect();
        obligations.sort_by_key(|o| o.created_at);
        Ok((ledger, obligations))
    }

    async fn settle(
        &self,
        id: ObligationId,
        action: SettlementAction,
    ) -> Result<SettlementOutcome, StoreError> {
        // Exclusive per-obligation lock held until this function returns.
        let _obligation_guard = self.entity_locks.acquire(*id.as_uuid()).await;

        let mut obligation = self.obligation(id).await?;
        let ledger_id = obligation.ledger_id;

        // Transition on the copy; a rejection leaves the tables untouched.
        obligation.apply(action)?;

        if action.affects_collected_total() {
            // Ledger lock second, and only then read the sibling set: any
            // concurrently settling sibling either committed before we got
            // here or is still waiting on this lock.
            let _ledger_guard = self.entity_locks.acquire(*ledger_id.as_uuid()).await;

            let mut ledger = self.ledger(ledger_id).await?;
            let mut siblings = self.obligations_for_ledger(ledger_id).await?;
            for sibling in &mut siblings {
                if sibling.id == obligation.id {
                    *sibling = obligation.clone();
                }
            }
            ledger.recompute_invariant(&siblings)?;

            let mut tables = self.tables.write().await;
            tables.obligations.insert(obligation.id, obligation.clone());
            tables.ledgers.insert(ledger.id, ledger.clone());
            Ok(SettlementOutcome { obligation, ledger })
        } else {
            let ledger = self.ledger(ledger_id).await?;
            let mut tables = self.tables.write().await;
            tables.obligations.insert(obligation.id, obligation.clone());
            Ok(SettlementOutcome { obligation, ledger })
        }
    }

    async fn save_descriptor(&self, id: ObligationId, descriptor: &str) -> Result<(), StoreError> {
        let _guard = self.entity_locks.acquire(*id.as_uuid()).await;
        let mut tables = self.tables.write().await;
        let obligation = tables
            .obligations
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("obligation", id))?;

        // First write wins; descriptors are immutable once rendered.
        if obligation.descriptor.is_none() {
            obligation.attach_descriptor(descriptor);
        }
        Ok(())
    }

    async fn obligations_referenced_in(
        &self,
        text: &str,
    ) -> Result<Vec<PaymentObligation>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .obligations
            .values()
            .filter(|o| text.contains(o.reference.as_str()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BankImportStore for MemoryStore {
    async fn insert_record(&self, record: BankTransactionRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .bank_records
            .values()
            .any(|r| r.external_id == record.external_id)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate external transaction id {}",
                record.external_id
            )));
        }
        tables.bank_records.insert(record.id, record);
        Ok(())
    }

    async fn record(&self, id: BankRecordId) -> Result<BankTransactionRecord, StoreError> {
        self.tables
            .read()
            .await
            .bank_records
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("bank record", id))
    }

    async fn mark_matched(
        &self,
        id: BankRecordId,
        obligation: ObligationId,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .bank_records
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("bank record", id))?;
        record.link(obligation);
        Ok(())
    }

    async fn unmatched_records(&self) -> Result<Vec<BankTransactionRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut records: Vec<BankTransactionRecord> = tables
            .bank_records
            .values()
            .filter(|r| !r.matched)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.imported_at);
        Ok(records)
    }
}
