//! Custom assertion helpers for domain types

use domain_settlement::{ObligationStatus, PaymentObligation, PurchaseLedger};

/// Asserts the ledger's cached state is exactly consistent with its
/// obligations
///
/// Panics with a diff-style message on drift.
pub fn assert_ledger_consistent(ledger: &PurchaseLedger, obligations: &[PaymentObligation]) {
    let collected: i64 = obligations
        .iter()
        .filter(|o| o.status == ObligationStatus::Paid)
        .map(|o| o.amount.to_minor().expect("amount fits minor units"))
        .sum();

    assert_eq!(
        ledger.collected_total.to_minor().expect("amount fits minor units"),
        collected,
        "collected_total {} does not match paid obligations summing to {} minor units",
        ledger.collected_total,
        collected
    );
    assert_eq!(
        ledger.fully_paid,
        collected >= ledger.total.to_minor().expect("amount fits minor units"),
        "fully_paid flag inconsistent with collected total"
    );
}

/// Asserts every pairwise share difference is at most one minor unit
pub fn assert_fair_split(obligations: &[PaymentObligation]) {
    let min = obligations.iter().map(|o| o.amount.to_minor().expect("amount fits minor units")).min();
    let max = obligations.iter().map(|o| o.amount.to_minor().expect("amount fits minor units")).max();
    if let (Some(min), Some(max)) = (min, max) {
        assert!(
            max - min <= 1,
            "share spread {} exceeds one minor unit",
            max - min
        );
    }
}
