//! Settlement store port
//!
//! The settlement domain never talks to a database directly. It defines the
//! `SettlementStore` trait here and application services are generic over it;
//! adapters in `infra_store` provide the implementations (in-memory with
//! per-entity mutexes, PostgreSQL with row locks).
//!
//! The contract for `settle` is mutual exclusion per entity during a
//! transition, expressed as one atomic unit of work: the adapter must hold an
//! exclusive lock on the obligation (and, when collected funds change, the
//! ledger) from before the first read until commit or rollback. No partial
//! state - obligation transitioned but ledger stale, or vice versa - may ever
//! be observable.

use async_trait::async_trait;
use core_kernel::{LedgerId, ObligationId};
use thiserror::Error;

use crate::error::SettlementError;
use crate::ledger::PurchaseLedger;
use crate::obligation::{PaymentObligation, SettlementAction};

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity was not found
    #[error("Not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation conflicts with existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A domain rule rejected the operation
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// The underlying storage backend failed
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True when the error is the benign already-settled condition
    pub fn is_already_paid(&self) -> bool {
        matches!(self, StoreError::Settlement(SettlementError::AlreadyPaid))
    }
}

/// Result of one settlement transition: both entities as persisted at commit
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub obligation: PaymentObligation,
    pub ledger: PurchaseLedger,
}

/// Persistence port for the settlement domain
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Persists a ledger and its full obligation set in one atomic unit
    ///
    /// Either everything is stored or nothing is.
    async fn create_ledger(
        &self,
        ledger: PurchaseLedger,
        obligations: Vec<PaymentObligation>,
    ) -> Result<(), StoreError>;

    /// Fetches one ledger
    async fn ledger(&self, id: LedgerId) -> Result<PurchaseLedger, StoreError>;

    /// Fetches one obligation
    async fn obligation(&self, id: ObligationId) -> Result<PaymentObligation, StoreError>;

    /// Fetches all obligations of a ledger
    async fn obligations_for_ledger(
        &self,
        id: LedgerId,
    ) -> Result<Vec<PaymentObligation>, StoreError>;

    /// Fetches a ledger together with its obligation set from one consistent
    /// snapshot
    ///
    /// Both entities must reflect the same point in time: a `settle`
    /// committing between the two reads would otherwise surface as invariant
    /// drift to a perfectly valid read.
    async fn ledger_with_obligations(
        &self,
        id: LedgerId,
    ) -> Result<(PurchaseLedger, Vec<PaymentObligation>), StoreError>;

    /// Applies one settlement action as an atomic, serializable unit of work
    ///
    /// The adapter must:
    /// 1. acquire an exclusive lock on the obligation, then read its state
    /// 2. apply the domain transition (surfacing `AlreadyPaid` /
    ///    `InvalidTransition` unchanged)
    /// 3. when the action affects collected funds, lock the owning ledger and
    ///    recompute its invariant from the obligation set
    /// 4. persist both entities and commit; roll everything back on failure
    async fn settle(
        &self,
        id: ObligationId,
        action: SettlementAction,
    ) -> Result<SettlementOutcome, StoreError>;

    /// Persists the encoded payment descriptor on an obligation
    async fn save_descriptor(
        &self,
        id: ObligationId,
        descriptor: &str,
    ) -> Result<(), StoreError>;

    /// Storage round-trip used by readiness probes
    ///
    /// Adapters backed by external storage override this with a real query;
    /// the in-process default is always ready.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Finds every obligation whose settlement reference occurs in `text`
    ///
    /// Used by the bank matcher; returning more than one candidate means the
    /// text is ambiguous and must not be matched.
    async fn obligations_referenced_in(
        &self,
        text: &str,
    ) -> Result<Vec<PaymentObligation>, StoreError>;
}
