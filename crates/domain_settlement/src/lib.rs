//! Settlement Domain - Purchase Splitting and Payment Tracking
//!
//! This crate implements the core of the shared-purchase system: splitting a
//! purchase total among participants with zero rounding loss, tracking each
//! participant's payment obligation through its lifecycle, and keeping the
//! parent ledger's collected totals exactly consistent with the obligation
//! set under concurrent settlement.
//!
//! # Obligation Lifecycle
//!
//! ```text
//! Unpaid -> Paid -> Refunded
//!        -> Failed
//! ```
//!
//! # Aggregate Invariant
//!
//! `ledger.collected_total == sum(amount of obligations with status Paid)`
//! and `ledger.fully_paid == (collected_total >= total)`, maintained inside
//! the same locked unit of work as every funds-affecting transition.

pub mod error;
pub mod ledger;
pub mod obligation;
pub mod ports;
pub mod reference;
pub mod services;
pub mod split;

pub use error::SettlementError;
pub use ledger::PurchaseLedger;
pub use obligation::{ObligationStatus, PaymentObligation, SettlementAction};
pub use ports::{SettlementOutcome, SettlementStore, StoreError};
pub use reference::SettlementReference;
pub use services::{LedgerOverview, NewPurchase, PurchaseService, ReconciliationService};
pub use split::{split, Share};
