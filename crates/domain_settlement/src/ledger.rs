//! Purchase ledger aggregate root
//!
//! A ledger records one shared purchase, its total, and the derived
//! collection state. The cached `collected_total`/`fully_paid` fields are
//! recomputed from the obligation set inside the same locked unit of work as
//! any status transition that moves collected funds; they are never derived
//! lazily from a stale read.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, GroupId, LedgerId, Money};

use crate::error::SettlementError;
use crate::obligation::PaymentObligation;

/// The aggregate record of one purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLedger {
    /// Unique identifier
    pub id: LedgerId,
    /// Owning group; `None` means a personal purchase with exactly one
    /// participant, auto-settled at creation
    pub group_id: Option<GroupId>,
    /// Total purchase amount (positive, minor-unit exact)
    pub total: Money,
    /// Purchase date
    pub purchased_on: NaiveDate,
    /// Where the purchase happened (opaque metadata)
    pub location: Option<String>,
    /// Free-text note (opaque metadata)
    pub note: Option<String>,
    /// Cached sum of amounts of obligations currently paid
    pub collected_total: Money,
    /// Cached `collected_total >= total`
    pub fully_paid: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl PurchaseLedger {
    /// Records a new purchase with nothing collected yet
    ///
    /// # Errors
    ///
    /// Returns a validation error if the total is not strictly positive.
    pub fn record(
        group_id: Option<GroupId>,
        total: Money,
        purchased_on: NaiveDate,
    ) -> Result<Self, SettlementError> {
        if !total.is_positive() {
            return Err(SettlementError::invalid_amount(format!(
                "purchase total must be positive, got {total}"
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: LedgerId::new_v7(),
            group_id,
            total,
            purchased_on,
            location: None,
            note: None,
            collected_total: Money::zero(total.currency()),
            fully_paid: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Sets the purchase location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the free-text note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Ledger currency (the currency of the total)
    pub fn currency(&self) -> Currency {
        self.total.currency()
    }

    /// True when this is a personal purchase (no group)
    pub fn is_personal(&self) -> bool {
        self.group_id.is_none()
    }

    /// Recomputes the cached collection state from the obligation set
    ///
    /// Sums the amounts of obligations currently paid, writes
    /// `collected_total`, and derives `fully_paid`. Must be invoked inside
    /// the same locked unit of work as the obligation transition.
    pub fn recompute_invariant(
        &mut self,
        obligations: &[PaymentObligation],
    ) -> Result<(), SettlementError> {
        let mut collected = Money::zero(self.currency());
        for obligation in obligations.iter().filter(|o| o.is_collected()) {
            collected = collected.checked_add(&obligation.amount)?;
        }

        self.collected_total = collected;
        self.fully_paid = !collected.checked_sub(&self.total)?.is_negative();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Verifies the cached state against the obligation set without
    /// correcting it
    ///
    /// Drift means a transition escaped its locked unit of work. Silently
    /// "fixing" a money total would hide the bug, so this surfaces
    /// `InvariantDrift` instead.
    pub fn verify_invariant(
        &self,
        obligations: &[PaymentObligation],
    ) -> Result<(), SettlementError> {
        let mut recomputed = Money::zero(self.currency());
        for obligation in obligations.iter().filter(|o| o.is_collected()) {
            recomputed = recomputed.checked_add(&obligation.amount)?;
        }

        let fully_paid = !recomputed.checked_sub(&self.total)?.is_negative();
        if recomputed != self.collected_total || fully_paid != self.fully_paid {
            return Err(SettlementError::InvariantDrift {
                cached: self.collected_total.amount(),
                recomputed: recomputed.amount(),
            });
        }
        Ok(())
    }

    /// `max(0, total - collected_total)`; never negative
    pub fn outstanding_balance(&self) -> Money {
        self.total
            .saturating_sub(&self.collected_total)
            .unwrap_or_else(|_| Money::zero(self.currency()))
    }
}
