//! Payment obligation aggregate member
//!
//! One participant's individually tracked owed amount and payment status for
//! a purchase ledger. Obligations are created atomically with their ledger at
//! split time and are mutated only through validated status transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{LedgerId, Money, ObligationId, ParticipantId};

use crate::error::SettlementError;
use crate::reference::SettlementReference;

/// Obligation status
///
/// `Unpaid` is the initial state. `Failed` is terminal. `Refunded` is only
/// reachable from `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    Unpaid,
    Paid,
    Failed,
    Refunded,
}

impl ObligationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationStatus::Unpaid => "unpaid",
            ObligationStatus::Paid => "paid",
            ObligationStatus::Failed => "failed",
            ObligationStatus::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for ObligationStatus {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(ObligationStatus::Unpaid),
            "paid" => Ok(ObligationStatus::Paid),
            "failed" => Ok(ObligationStatus::Failed),
            "refunded" => Ok(ObligationStatus::Refunded),
            other => Err(SettlementError::validation(format!(
                "unknown obligation status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A settlement-affecting action requested against one obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementAction {
    /// Unpaid -> Paid; sets paid-at and the confirming party
    MarkPaid { confirmed_by: Option<ParticipantId> },
    /// Unpaid -> Failed
    MarkFailed,
    /// Paid -> Refunded; collected funds shrink
    MarkRefunded,
}

impl SettlementAction {
    /// True when applying this action changes the ledger's collected total
    /// and therefore requires an invariant recompute in the same unit of work
    pub fn affects_collected_total(&self) -> bool {
        matches!(
            self,
            SettlementAction::MarkPaid { .. } | SettlementAction::MarkRefunded
        )
    }
}

/// One participant's owed amount for one purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentObligation {
    /// Unique identifier
    pub id: ObligationId,
    /// Owning ledger (exclusive ownership; deleted with the ledger)
    pub ledger_id: LedgerId,
    /// Participant who owes this share
    pub participant: ParticipantId,
    /// Owed amount, exact to the minor unit
    pub amount: Money,
    /// Status
    pub status: ObligationStatus,
    /// Globally unique bank-matching key; generated once, immutable
    pub reference: SettlementReference,
    /// When the obligation was settled
    pub paid_at: Option<DateTime<Utc>>,
    /// Who confirmed the settlement
    pub confirmed_by: Option<ParticipantId>,
    /// Persisted payment descriptor text for idempotent re-rendering
    pub descriptor: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl PaymentObligation {
    /// Creates a new unpaid obligation for a share of a purchase
    pub fn new(ledger_id: LedgerId, participant: ParticipantId, amount: Money) -> Self {
        let now = Utc::now();
        let id = ObligationId::new_v7();

        Self {
            id,
            ledger_id,
            participant,
            amount,
            status: ObligationStatus::Unpaid,
            reference: SettlementReference::generate(id),
            paid_at: None,
            confirmed_by: None,
            descriptor: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an obligation already settled at creation time
    ///
    /// Used for personal purchases, where the single participant's share is
    /// auto-settled and no settlement cycle ever runs.
    pub fn settled_at_creation(
        ledger_id: LedgerId,
        participant: ParticipantId,
        amount: Money,
    ) -> Self {
        let mut obligation = Self::new(ledger_id, participant, amount);
        obligation.status = ObligationStatus::Paid;
        obligation.paid_at = Some(obligation.created_at);
        obligation
    }

    /// Applies a settlement action, enforcing the transition table
    ///
    /// # Errors
    ///
    /// - `AlreadyPaid` when paying an obligation that is already `Paid`;
    ///   callers treat this as a benign idempotent outcome
    /// - `InvalidTransition` for any other illegal edge
    pub fn apply(&mut self, action: SettlementAction) -> Result<(), SettlementError> {
        match action {
            SettlementAction::MarkPaid { confirmed_by } => self.mark_paid(confirmed_by),
            SettlementAction::MarkFailed => self.mark_failed(),
            SettlementAction::MarkRefunded => self.mark_refunded(),
        }
    }

    fn mark_paid(&mut self, confirmed_by: Option<ParticipantId>) -> Result<(), SettlementError> {
        match self.status {
            ObligationStatus::Paid => Err(SettlementError::AlreadyPaid),
            ObligationStatus::Unpaid => {
                self.status = ObligationStatus::Paid;
                self.paid_at = Some(Utc::now());
                self.confirmed_by = confirmed_by;
                self.updated_at = Utc::now();
                Ok(())
            }
            other => Err(self.invalid_transition(other, ObligationStatus::Paid)),
        }
    }

    fn mark_failed(&mut self) -> Result<(), SettlementError> {
        match self.status {
            ObligationStatus::Unpaid => {
                self.status = ObligationStatus::Failed;
                self.updated_at = Utc::now();
                Ok(())
            }
            other => Err(self.invalid_transition(other, ObligationStatus::Failed)),
        }
    }

    fn mark_refunded(&mut self) -> Result<(), SettlementError> {
        match self.status {
            ObligationStatus::Paid => {
                self.status = ObligationStatus::Refunded;
                self.updated_at = Utc::now();
                Ok(())
            }
            other => Err(self.invalid_transition(other, ObligationStatus::Refunded)),
        }
    }

    fn invalid_transition(
        &self,
        from: ObligationStatus,
        to: ObligationStatus,
    ) -> SettlementError {
        SettlementError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// True if this obligation currently counts toward collected funds
    pub fn is_collected(&self) -> bool {
        self.status == ObligationStatus::Paid
    }

    /// Attaches the encoded payment descriptor for idempotent re-rendering
    pub fn attach_descriptor(&mut self, descriptor: impl Into<String>) {
        self.descriptor = Some(descriptor.into());
        self.updated_at = Utc::now();
    }
}
