//! Application services for purchase recording and reconciliation
//!
//! Services are generic over the [`SettlementStore`] port and carry the
//! orchestration, logging, and input validation; all locking lives behind the
//! port's `settle` contract.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use core_kernel::{GroupId, LedgerId, Money, ObligationId, ParticipantId};

use crate::error::SettlementError;
use crate::ledger::PurchaseLedger;
use crate::obligation::{PaymentObligation, SettlementAction};
use crate::ports::{SettlementOutcome, SettlementStore, StoreError};
use crate::split::split;

/// Input for recording a new purchase
#[derive(Debug, Clone)]
pub struct NewPurchase {
    /// Owning group; `None` records a personal purchase
    pub group_id: Option<GroupId>,
    /// Total amount, minor-unit exact
    pub total: Money,
    /// Purchase date
    pub purchased_on: NaiveDate,
    /// Ordered participant list; order decides who absorbs remainder units
    pub participants: Vec<ParticipantId>,
    /// Optional location metadata (opaque)
    pub location: Option<String>,
    /// Optional note metadata (opaque)
    pub note: Option<String>,
}

/// A ledger together with its obligations and derived balance
#[derive(Debug, Clone)]
pub struct LedgerOverview {
    pub ledger: PurchaseLedger,
    pub obligations: Vec<PaymentObligation>,
    pub outstanding: Money,
}

/// Records purchases and exposes ledger reads
pub struct PurchaseService<S> {
    store: Arc<S>,
}

impl<S: SettlementStore> PurchaseService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a ledger and its obligation set atomically in one unit of work
    ///
    /// Group purchases split the total across the participants in their given
    /// order. A personal purchase (no group, exactly one participant) is the
    /// deliberate single-party shortcut: its one obligation is created
    /// already paid and the ledger is fully paid from the start.
    pub async fn create_with_split(
        &self,
        request: NewPurchase,
    ) -> Result<LedgerOverview, StoreError> {
        if request.group_id.is_none() && request.participants.len() != 1 {
            return Err(SettlementError::validation(
                "a personal purchase must have exactly one participant",
            )
            .into());
        }

        let shares = split(request.total, &request.participants)?;

        let mut ledger =
            PurchaseLedger::record(request.group_id, request.total, request.purchased_on)?;
        if let Some(location) = request.location {
            ledger = ledger.with_location(location);
        }
        if let Some(note) = request.note {
            ledger = ledger.with_note(note);
        }

        let personal = ledger.is_personal();
        let obligations: Vec<PaymentObligation> = shares
            .into_iter()
            .map(|share| {
                if personal {
                    PaymentObligation::settled_at_creation(
                        ledger.id,
                        share.participant,
                        share.amount,
                    )
                } else {
                    PaymentObligation::new(ledger.id, share.participant, share.amount)
                }
            })
            .collect();

        ledger.recompute_invariant(&obligations)?;

        self.store
            .create_ledger(ledger.clone(), obligations.clone())
            .await?;

        info!(
            ledger_id = %ledger.id,
            total = %ledger.total,
            participants = obligations.len(),
            personal,
            "Recorded purchase"
        );

        let outstanding = ledger.outstanding_balance();
        Ok(LedgerOverview {
            ledger,
            obligations,
            outstanding,
        })
    }

    /// Fetches a ledger with its obligations, verifying the cached invariant
    ///
    /// Drift between cached totals and the obligation set is a fatal
    /// integrity condition and is surfaced, never repaired here.
    pub async fn ledger_overview(&self, id: LedgerId) -> Result<LedgerOverview, StoreError> {
        let (ledger, obligations) = self.store.ledger_with_obligations(id).await?;

        if let Err(drift) = ledger.verify_invariant(&obligations) {
            error!(ledger_id = %id, %drift, "Ledger invariant drift detected");
            return Err(drift.into());
        }

        let outstanding = ledger.outstanding_balance();
        Ok(LedgerOverview {
            ledger,
            obligations,
            outstanding,
        })
    }
}

/// Safely mutates obligation status and the owning ledger's invariant
///
/// Each operation is one atomic, serializable unit resistant to lost updates
/// from concurrent settlement attempts; the store's `settle` contract carries
/// the locking discipline.
pub struct ReconciliationService<S> {
    store: Arc<S>,
}

impl<S: SettlementStore> ReconciliationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Transitions an obligation to paid and recomputes the ledger invariant
    ///
    /// Re-invoking on an already-paid obligation is safe: it surfaces as a
    /// reported `AlreadyPaid` without a second transition or double count.
    pub async fn mark_paid(
        &self,
        id: ObligationId,
        confirmed_by: Option<ParticipantId>,
    ) -> Result<SettlementOutcome, StoreError> {
        let result = self
            .store
            .settle(id, SettlementAction::MarkPaid { confirmed_by })
            .await;

        match &result {
            Ok(outcome) => info!(
                obligation_id = %id,
                ledger_id = %outcome.ledger.id,
                collected = %outcome.ledger.collected_total,
                fully_paid = outcome.ledger.fully_paid,
                "Obligation settled"
            ),
            Err(e) if e.is_already_paid() => {
                warn!(obligation_id = %id, "Duplicate settlement attempt ignored")
            }
            Err(e) => warn!(obligation_id = %id, error = %e, "Settlement failed"),
        }

        result
    }

    /// Transitions an obligation to failed; collected funds are untouched
    pub async fn mark_failed(&self, id: ObligationId) -> Result<SettlementOutcome, StoreError> {
        let outcome = self.store.settle(id, SettlementAction::MarkFailed).await?;
        info!(obligation_id = %id, "Obligation marked failed");
        Ok(outcome)
    }

    /// Transitions a paid obligation to refunded and shrinks collected funds
    pub async fn mark_refunded(&self, id: ObligationId) -> Result<SettlementOutcome, StoreError> {
        let outcome = self
            .store
            .settle(id, SettlementAction::MarkRefunded)
            .await?;
        info!(
            obligation_id = %id,
            collected = %outcome.ledger.collected_total,
            "Obligation refunded"
        );
        Ok(outcome)
    }
}
