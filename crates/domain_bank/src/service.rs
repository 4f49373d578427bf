//! Descriptor rendering service
//!
//! Produces the payment descriptor for an obligation and persists it, so
//! re-rendering the QR code later returns the exact same bytes.

use std::sync::Arc;

use tracing::info;

use core_kernel::ObligationId;
use domain_settlement::{SettlementStore, StoreError};

use crate::descriptor::{encode, Recipient};

/// Generates and persists payment descriptors
pub struct DescriptorService<S> {
    store: Arc<S>,
    recipient: Recipient,
}

impl<S: SettlementStore> DescriptorService<S> {
    /// `recipient` is the configured account of whoever fronts the purchases
    pub fn new(store: Arc<S>, recipient: Recipient) -> Self {
        Self { store, recipient }
    }

    /// Returns the descriptor for an obligation, encoding it on first use
    ///
    /// Once persisted the stored string is returned verbatim; the encoder is
    /// never re-run against an obligation that already carries a descriptor,
    /// so downstream QR images stay byte-stable even if recipient
    /// configuration changes later.
    pub async fn descriptor_for(&self, id: ObligationId) -> Result<String, StoreError> {
        let obligation = self.store.obligation(id).await?;

        if let Some(existing) = obligation.descriptor {
            return Ok(existing);
        }

        let ledger = self.store.ledger(obligation.ledger_id).await?;
        let descriptor = encode(
            &self.recipient,
            obligation.amount,
            &obligation.reference,
            ledger.note.as_deref(),
        );

        self.store.save_descriptor(id, &descriptor).await?;
        info!(obligation_id = %id, "Payment descriptor generated");
        Ok(descriptor)
    }
}
