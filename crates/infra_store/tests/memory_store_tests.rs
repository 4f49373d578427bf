//! Integration tests for the in-memory store adapter
//!
//! Exercises the settle contract end to end through the application
//! services: atomicity, idempotent settlement, invariant maintenance under
//! concurrent access, and descriptor persistence.

use std::sync::Arc;

use rust_decimal_macros::dec;

use domain_bank::{BankImportStore, BankMatcher, BankTransactionRecord, DescriptorService, Recipient};
use domain_settlement::{
    ObligationStatus, PurchaseService, ReconciliationService, SettlementError, StoreError,
};
use infra_store::MemoryStore;
use test_utils::{assert_fair_split, assert_ledger_consistent, czk, purchase_date, PurchaseBuilder};

fn recipient() -> Recipient {
    Recipient {
        account: "CZ6508000000192000145399".to_string(),
        name: Some("Coffee Fund".to_string()),
    }
}

#[tokio::test]
async fn recorded_purchase_is_readable_and_consistent() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());

    let created = purchases
        .create_with_split(PurchaseBuilder::new().total(czk(dec!(100.00))).build())
        .await
        .unwrap();

    assert_eq!(created.obligations.len(), 3);
    assert_fair_split(&created.obligations);

    let fetched = purchases.ledger_overview(created.ledger.id).await.unwrap();
    assert_eq!(fetched.ledger.total, czk(dec!(100.00)));
    assert_eq!(fetched.outstanding, czk(dec!(100.00)));
    assert!(!fetched.ledger.fully_paid);
    assert_ledger_consistent(&fetched.ledger, &fetched.obligations);
}

#[tokio::test]
async fn personal_purchase_is_fully_paid_at_creation() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());

    let created = purchases
        .create_with_split(
            PurchaseBuilder::new()
                .personal()
                .total(czk(dec!(42.50)))
                .build(),
        )
        .await
        .unwrap();

    assert!(created.ledger.fully_paid);
    assert_eq!(created.ledger.collected_total, czk(dec!(42.50)));
    assert_eq!(created.obligations.len(), 1);
    assert_eq!(created.obligations[0].status, ObligationStatus::Paid);
    assert!(created.outstanding.is_zero());
}

#[tokio::test]
async fn settling_every_obligation_completes_the_ledger() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());
    let reconciliation = ReconciliationService::new(store.clone());

    let created = purchases
        .create_with_split(PurchaseBuilder::new().total(czk(dec!(100.00))).build())
        .await
        .unwrap();

    let mut last = None;
    for obligation in &created.obligations {
        last = Some(reconciliation.mark_paid(obligation.id, None).await.unwrap());
    }

    let final_ledger = last.unwrap().ledger;
    assert_eq!(final_ledger.collected_total, czk(dec!(100.00)));
    assert!(final_ledger.fully_paid);
    assert!(final_ledger.outstanding_balance().is_zero());

    let overview = purchases.ledger_overview(created.ledger.id).await.unwrap();
    assert_ledger_consistent(&overview.ledger, &overview.obligations);
}

#[tokio::test]
async fn second_mark_paid_reports_already_paid_without_double_count() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());
    let reconciliation = ReconciliationService::new(store.clone());

    let created = purchases
        .create_with_split(PurchaseBuilder::new().build())
        .await
        .unwrap();
    let target = created.obligations[0].id;

    let first = reconciliation.mark_paid(target, None).await.unwrap();
    let err = reconciliation.mark_paid(target, None).await.unwrap_err();

    assert!(err.is_already_paid());

    let overview = purchases.ledger_overview(created.ledger.id).await.unwrap();
    assert_eq!(
        overview.ledger.collected_total,
        first.ledger.collected_total
    );
    assert_ledger_consistent(&overview.ledger, &overview.obligations);
}

#[tokio::test]
async fn concurrent_payments_of_one_obligation_settle_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());

    let created = purchases
        .create_with_split(PurchaseBuilder::new().total(czk(dec!(100.00))).build())
        .await
        .unwrap();
    let target = created.obligations[0].id;
    let share = created.obligations[0].amount;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            ReconciliationService::new(store).mark_paid(target, None).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert!(e.is_already_paid(), "unexpected error: {e}"),
        }
    }

    assert_eq!(successes, 1);

    let overview = purchases.ledger_overview(created.ledger.id).await.unwrap();
    assert_eq!(overview.ledger.collected_total, share);
    assert_ledger_consistent(&overview.ledger, &overview.obligations);
}

#[tokio::test]
async fn concurrent_sibling_settlements_lose_no_updates() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());

    let created = purchases
        .create_with_split(PurchaseBuilder::new().total(czk(dec!(100.00))).build())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for obligation in &created.obligations {
        let store = store.clone();
        let id = obligation.id;
        handles.push(tokio::spawn(async move {
            ReconciliationService::new(store).mark_paid(id, None).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let overview = purchases.ledger_overview(created.ledger.id).await.unwrap();
    assert_eq!(overview.ledger.collected_total, czk(dec!(100.00)));
    assert!(overview.ledger.fully_paid);
    assert_ledger_consistent(&overview.ledger, &overview.obligations);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overview_reads_stay_consistent_during_settlement() {
    for _ in 0..100 {
        let store = Arc::new(MemoryStore::new());
        let purchases = Arc::new(PurchaseService::new(store.clone()));

        let created = purchases
            .create_with_split(PurchaseBuilder::new().total(czk(dec!(100.00))).build())
            .await
            .unwrap();
        let ledger_id = created.ledger.id;

        // A reader polling the overview while every sibling settles must
        // never observe a torn ledger/obligation pair.
        let reader_purchases = purchases.clone();
        let reader = tokio::spawn(async move {
            loop {
                let overview = reader_purchases.ledger_overview(ledger_id).await.unwrap();
                assert_ledger_consistent(&overview.ledger, &overview.obligations);
                if overview.ledger.fully_paid {
                    break;
                }
                tokio::task::yield_now().await;
            }
        });

        let mut settlers = Vec::new();
        for obligation in &created.obligations {
            let store = store.clone();
            let id = obligation.id;
            settlers.push(tokio::spawn(async move {
                ReconciliationService::new(store).mark_paid(id, None).await
            }));
        }
        for handle in settlers {
            handle.await.unwrap().unwrap();
        }
        reader.await.unwrap();
    }
}

#[tokio::test]
async fn rejected_transition_leaves_state_untouched() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());
    let reconciliation = ReconciliationService::new(store.clone());

    let created = purchases
        .create_with_split(PurchaseBuilder::new().build())
        .await
        .unwrap();
    let target = created.obligations[0].id;

    // Refund requires a prior paid state.
    let err = reconciliation.mark_refunded(target).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Settlement(SettlementError::InvalidTransition { .. })
    ));

    let overview = purchases.ledger_overview(created.ledger.id).await.unwrap();
    assert!(overview.ledger.collected_total.is_zero());
    assert_eq!(
        overview
            .obligations
            .iter()
            .find(|o| o.id == target)
            .unwrap()
            .status,
        ObligationStatus::Unpaid
    );
}

#[tokio::test]
async fn failure_and_refund_keep_the_ledger_consistent() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());
    let reconciliation = ReconciliationService::new(store.clone());

    let created = purchases
        .create_with_split(PurchaseBuilder::new().total(czk(dec!(90.00))).build())
        .await
        .unwrap();
    let failing = created.obligations[0].id;
    let paying = created.obligations[1].id;
    let share = created.obligations[1].amount;

    // Failure never touches collected funds, and the state is terminal.
    let failed = reconciliation.mark_failed(failing).await.unwrap();
    assert_eq!(failed.obligation.status, ObligationStatus::Failed);
    assert!(failed.ledger.collected_total.is_zero());
    let err = reconciliation.mark_paid(failing, None).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Settlement(SettlementError::InvalidTransition { .. })
    ));

    let paid = reconciliation.mark_paid(paying, None).await.unwrap();
    assert_eq!(paid.ledger.collected_total, share);

    let refunded = reconciliation.mark_refunded(paying).await.unwrap();
    assert!(refunded.ledger.collected_total.is_zero());
    assert!(!refunded.ledger.fully_paid);

    let overview = purchases.ledger_overview(created.ledger.id).await.unwrap();
    assert_ledger_consistent(&overview.ledger, &overview.obligations);
}

#[tokio::test]
async fn descriptor_is_rendered_once_and_returned_verbatim() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());
    let descriptors = DescriptorService::new(store.clone(), recipient());

    let created = purchases
        .create_with_split(
            PurchaseBuilder::new()
                .total(czk(dec!(150.00)))
                .note("friday espresso round")
                .build(),
        )
        .await
        .unwrap();
    let target = created.obligations[0].id;

    let first = descriptors.descriptor_for(target).await.unwrap();
    let second = descriptors.descriptor_for(target).await.unwrap();

    assert_eq!(first, second);
    assert!(first.starts_with("SPD*1.0*ACC:CZ6508000000192000145399*"));
    assert!(first.contains(&format!(
        "X-REF:{}",
        created.obligations[0].reference.as_str()
    )));

    // A differently configured service must not re-render an existing one.
    let other = DescriptorService::new(
        store.clone(),
        Recipient {
            account: "CZ0708000000001234567890".to_string(),
            name: None,
        },
    );
    assert_eq!(other.descriptor_for(target).await.unwrap(), first);
}

#[tokio::test]
async fn bank_import_matches_a_uniquely_referenced_record() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());
    let matcher = BankMatcher::new(store.clone());

    let created = purchases
        .create_with_split(PurchaseBuilder::new().total(czk(dec!(100.00))).build())
        .await
        .unwrap();
    let target = &created.obligations[1];

    let record = matcher
        .import(BankTransactionRecord::imported(
            "tx-9001",
            target.amount,
            format!("coffee payment {}", target.reference),
            purchase_date(),
        ))
        .await
        .unwrap();

    assert!(record.matched);
    assert_eq!(record.matched_obligation, Some(target.id));

    // Matching is advisory; the obligation is still unpaid.
    let overview = purchases.ledger_overview(created.ledger.id).await.unwrap();
    assert!(overview.ledger.collected_total.is_zero());
}

#[tokio::test]
async fn rematch_sweep_picks_up_later_purchases() {
    let store = Arc::new(MemoryStore::new());
    let purchases = PurchaseService::new(store.clone());
    let matcher = BankMatcher::new(store.clone());

    let orphan = matcher
        .import(BankTransactionRecord::imported(
            "tx-9002",
            czk(dec!(33.34)),
            "payment 0BADF00D-123456",
            purchase_date(),
        ))
        .await
        .unwrap();
    assert!(!orphan.matched);

    let created = purchases
        .create_with_split(PurchaseBuilder::new().build())
        .await
        .unwrap();
    let target = &created.obligations[0];

    matcher
        .import(BankTransactionRecord::imported(
            "tx-9003",
            target.amount,
            format!("ref {}", target.reference),
            purchase_date(),
        ))
        .await
        .unwrap();

    // The orphan stays unmatched; nothing ever carried its reference.
    assert_eq!(matcher.rematch_unmatched().await.unwrap(), 0);
    assert_eq!(store.unmatched_records().await.unwrap().len(), 1);
}
