//! Integration tests for the PostgreSQL store adapter
//!
//! These run against a real database and are ignored by default:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/brewledger_test \
//!     cargo test -p infra_store -- --ignored
//! ```
//!
//! Every test creates its own ledger under fresh ids, so reruns against the
//! same database do not interfere with each other.

use std::sync::Arc;

use rust_decimal_macros::dec;

use domain_settlement::{PurchaseService, ReconciliationService};
use infra_store::{create_pool, PgStore, StoreConfig};
use test_utils::{assert_ledger_consistent, czk, PurchaseBuilder};

async fn pg_store() -> Arc<PgStore> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let pool = create_pool(StoreConfig::new(&url))
        .await
        .expect("connecting to the test database");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("applying migrations");
    Arc::new(PgStore::new(pool))
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a PostgreSQL instance"]
async fn settlement_is_idempotent_against_postgres() {
    let store = pg_store().await;
    let purchases = PurchaseService::new(store.clone());
    let reconciliation = ReconciliationService::new(store.clone());

    let created = purchases
        .create_with_split(PurchaseBuilder::new().total(czk(dec!(100.00))).build())
        .await
        .unwrap();

    let target = created.obligations[0].id;
    let outcome = reconciliation.mark_paid(target, None).await.unwrap();
    assert_eq!(outcome.ledger.collected_total, czk(dec!(33.34)));

    let second = reconciliation.mark_paid(target, None).await;
    assert!(matches!(second, Err(ref e) if e.is_already_paid()));

    let overview = purchases.ledger_overview(created.ledger.id).await.unwrap();
    assert_eq!(overview.ledger.collected_total, czk(dec!(33.34)));
    assert_ledger_consistent(&overview.ledger, &overview.obligations);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "needs DATABASE_URL pointing at a PostgreSQL instance"]
async fn concurrent_sibling_settlements_hold_the_invariant_in_postgres() {
    let store = pg_store().await;
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
#[ignore = "needs DATABASE_URL pointing at a PostgreSQL instance"]
async fn overview_snapshot_is_consistent_during_postgres_settlement() {
    let store = pg_store().await;
    let purchases = Arc::new(PurchaseService::new(store.clone()));

    let created = purchases
        .create_with_split(PurchaseBuilder::new().total(czk(dec!(100.00))).build())
        .await
        .unwrap();
    let ledger_id = created.ledger.id;

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
