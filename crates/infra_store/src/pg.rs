//! PostgreSQL store adapter
//!
//! Implements the settlement and bank-import ports over sqlx with explicit
//! transactions. The settle contract's exclusive locks are row locks:
//! `SELECT ... FOR UPDATE` on the obligation row first, then on the ledger
//! row when collected funds change, both held until commit. Queries are
//! runtime-bound so the crate builds without a live database; the schema
//! lives in `migrations/0001_init.sql`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use core_kernel::{
    BankRecordId, Currency, GroupId, LedgerId, Money, ObligationId, ParticipantId,
};
use domain_bank::{BankImportStore, BankTransactionRecord};
use domain_settlement::{
    ObligationStatus, PaymentObligation, PurchaseLedger, SettlementAction, SettlementError,
    SettlementOutcome, SettlementReference, SettlementStore, StoreError,
};

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Maps unique-constraint violations to `Conflict`, everything else to
/// `Backend`
fn write_err(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    backend(e)
}

fn money_from_row(row: &PgRow, amount_col: &str) -> Result<Money, StoreError> {
    let code: String = row.try_get("currency").map_err(backend)?;
    let currency: Currency = code.parse().map_err(SettlementError::from)?;
    let amount: Decimal = row.try_get(amount_col).map_err(backend)?;
    Ok(Money::new(amount, currency).map_err(SettlementError::from)?)
}

fn ledger_from_row(row: &PgRow) -> Result<PurchaseLedger, StoreError> {
    Ok(PurchaseLedger {
        id: LedgerId::from_uuid(row.try_get("id").map_err(backend)?),
        group_id: row
            .try_get::<Option<Uuid>, _>("group_id")
            .map_err(backend)?
            .map(GroupId::from_uuid),
        total: money_from_row(row, "total")?,
        purchased_on: row.try_get::<NaiveDate, _>("purchased_on").map_err(backend)?,
        location: row.try_get("location").map_err(backend)?,
        note: row.try_get("note").map_err(backend)?,
        collected_total: money_from_row(row, "collected_total")?,
        fully_paid: row.try_get("fully_paid").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

fn obligation_from_row(row: &PgRow) -> Result<PaymentObligation, StoreError> {
    let status: String = row.try_get("status").map_err(backend)?;
    Ok(PaymentObligation {
        id: ObligationId::from_uuid(row.try_get("id").map_err(backend)?),
        ledger_id: LedgerId::from_uuid(row.try_get("ledger_id").map_err(backend)?),
        participant: ParticipantId::from_uuid(row.try_get("participant_id").map_err(backend)?),
        amount: money_from_row(row, "amount")?,
        status: status.parse::<ObligationStatus>()?,
        reference: SettlementReference::from_stored(
            row.try_get::<String, _>("reference").map_err(backend)?,
        ),
        paid_at: row
            .try_get::<Option<DateTime<Utc>>, _>("paid_at")
            .map_err(backend)?,
        confirmed_by: row
            .try_get::<Option<Uuid>, _>("confirmed_by")
            .map_err(backend)?
            .map(ParticipantId::from_uuid),
        descriptor: row.try_get("descriptor").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

fn bank_record_from_row(row: &PgRow) -> Result<BankTransactionRecord, StoreError> {
    Ok(BankTransactionRecord {
        id: BankRecordId::from_uuid(row.try_get("id").map_err(backend)?),
        external_id: row.try_get("external_id").map_err(backend)?,
        amount: money_from_row(row, "amount")?,
        reference_text: row.try_get("reference_text").map_err(backend)?,
        transacted_on: row.try_get("transacted_on").map_err(backend)?,
        matched_obligation: row
            .try_get::<Option<Uuid>, _>("matched_obligation")
            .map_err(backend)?
            .map(ObligationId::from_uuid),
        matched: row.try_get("matched").map_err(backend)?,
        imported_at: row.try_get("imported_at").map_err(backend)?,
    })
}

const OBLIGATION_COLUMNS: &str = "id, ledger_id, participant_id, amount, currency, status, \
     reference, paid_at, confirmed_by, descriptor, created_at, updated_at";

const LEDGER_COLUMNS: &str = "id, group_id, total, currency, purchased_on, location, note, \
     collected_total, fully_paid, created_at, updated_at";

#[async_trait]
impl SettlementStore for PgStore {
    async fn create_ledger(
        &self,
        ledger: PurchaseLedger,
        obligations: Vec<PaymentObligation>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "INSERT INTO purchase_ledgers \
             (id, group_id, total, currency, purchased_on, location, note, \
              collected_total, fully_paid, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(*ledger.id.as_uuid())
        .bind(ledger.group_id.map(|g| *g.as_uuid()))
        .bind(ledger.total.amount())
        .bind(ledger.currency().code())
        .bind(ledger.purchased_on)
        .bind(&ledger.location)
        .bind(&ledger.note)
        .bind(ledger.collected_total.amount())
        .bind(ledger.fully_paid)
        .bind(ledger.created_at)
        .bind(ledger.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        for obligation in &obligations {
            sqlx::query(
                "INSERT INTO payment_obligations \
                 (id, ledger_id, participant_id, amount, currency, status, reference, \
                  paid_at, confirmed_by, descriptor, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(*obligation.id.as_uuid())
            .bind(*obligation.ledger_id.as_uuid())
            .bind(*obligation.participant.as_uuid())
            .bind(obligation.amount.amount())
            .bind(obligation.amount.currency().code())
            .bind(obligation.status.as_str())
            .bind(obligation.reference.as_str())
            .bind(obligation.paid_at)
            .bind(obligation.confirmed_by.map(|p| *p.as_uuid()))
            .bind(&obligation.descriptor)
            .bind(obligation.created_at)
            .bind(obligation.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        tx.commit().await.map_err(backend)
    }

    async fn ledger(&self, id: LedgerId) -> Result<PurchaseLedger, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {LEDGER_COLUMNS} FROM purchase_ledgers WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::not_found("ledger", id))?;

        ledger_from_row(&row)
    }

    async fn obligation(&self, id: ObligationId) -> Result<PaymentObligation, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {OBLIGATION_COLUMNS} FROM payment_obligations WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::not_found("obligation", id))?;

        obligation_from_row(&row)
    }

    async fn obligations_for_ledger(
        &self,
        id: LedgerId,
    ) -> Result<Vec<PaymentObligation>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {OBLIGATION_COLUMNS} FROM payment_obligations \
             WHERE ledger_id = $1 ORDER BY created_at"
        ))
        .bind(*id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(obligation_from_row).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn ledger_with_obligations(
        &self,
        id: LedgerId,
    ) -> Result<(PurchaseLedger, Vec<PaymentObligation>), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Repeatable read gives both statements the same snapshot, so a
        // settlement committing between them cannot split the view.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let row = sqlx::query(&format!(
            "SELECT {LEDGER_COLUMNS} FROM purchase_ledgers WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::not_found("ledger", id))?;
        let ledger = ledger_from_row(&row)?;

        let rows = sqlx::query(&format!(
            "SELECT {OBLIGATION_COLUMNS} FROM payment_obligations \
             WHERE ledger_id = $1 ORDER BY created_at"
        ))
        .bind(*id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;
        let obligations = rows
            .iter()
            .map(obligation_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tx.commit().await.map_err(backend)?;
        Ok((ledger, obligations))
    }

    async fn settle(
        &self,
        id: ObligationId,
        action: SettlementAction,
    ) -> Result<SettlementOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Row lock on the obligation before reading its state.
        let row = sqlx::query(&format!(
            "SELECT {OBLIGATION_COLUMNS} FROM payment_obligations WHERE id = $1 FOR UPDATE"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::not_found("obligation", id))?;

        let mut obligation = obligation_from_row(&row)?;
        let ledger_id = obligation.ledger_id;

        // A rejected transition drops the transaction: automatic rollback.
        obligation.apply(action)?;

        sqlx::query(
            "UPDATE payment_obligations \
             SET status = $2, paid_at = $3, confirmed_by = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(*obligation.id.as_uuid())
        .bind(obligation.status.as_str())
        .bind(obligation.paid_at)
        .bind(obligation.confirmed_by.map(|p| *p.as_uuid()))
        .bind(obligation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        let ledger = if action.affects_collected_total() {
            // Ledger row lock second; sibling reads below then see only
            // committed sibling transitions.
            let lrow = sqlx::query(&format!(
                "SELECT {LEDGER_COLUMNS} FROM purchase_ledgers WHERE id = $1 FOR UPDATE"
            ))
            .bind(*ledger_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::not_found("ledger", ledger_id))?;

            let mut ledger = ledger_from_row(&lrow)?;

            let sibling_rows = sqlx::query(&format!(
                "SELECT {OBLIGATION_COLUMNS} FROM payment_obligations \
                 WHERE ledger_id = $1 ORDER BY created_at"
            ))
            .bind(*ledger_id.as_uuid())
            .fetch_all(&mut *tx)
            .await
            .map_err(backend)?;

            let siblings: Vec<PaymentObligation> = sibling_rows
                .iter()
                .map(obligation_from_row)
                .collect::<Result<_, _>>()?;
            ledger.recompute_invariant(&siblings)?;

            sqlx::query(
                "UPDATE purchase_ledgers \
                 SET collected_total = $2, fully_paid = $3, updated_at = $4 \
                 WHERE id = $1",
            )
            .bind(*ledger.id.as_uuid())
            .bind(ledger.collected_total.amount())
            .bind(ledger.fully_paid)
            .bind(ledger.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

            ledger
        } else {
            let lrow = sqlx::query(&format!(
                "SELECT {LEDGER_COLUMNS} FROM purchase_ledgers WHERE id = $1"
            ))
            .bind(*ledger_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::not_found("ledger", ledger_id))?;
            ledger_from_row(&lrow)?
        };

        tx.commit().await.map_err(backend)?;
        Ok(SettlementOutcome { obligation, ledger })
    }

    async fn save_descriptor(&self, id: ObligationId, descriptor: &str) -> Result<(), StoreError> {
        // First write wins; a descriptor is immutable once rendered.
        let result = sqlx::query(
            "UPDATE payment_obligations \
             SET descriptor = $2, updated_at = $3 \
             WHERE id = $1 AND descriptor IS NULL",
        )
        .bind(*id.as_uuid())
        .bind(descriptor)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            // Distinguish "already rendered" (fine) from "unknown obligation"
            self.obligation(id).await?;
        }
        Ok(())
    }

    async fn obligations_referenced_in(
        &self,
        text: &str,
    ) -> Result<Vec<PaymentObligation>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {OBLIGATION_COLUMNS} FROM payment_obligations WHERE strpos($1, reference) > 0"
        ))
        .bind(text)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(obligation_from_row).collect()
    }
}

#[async_trait]
impl BankImportStore for PgStore {
    async fn insert_record(&self, record: BankTransactionRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO bank_transaction_records \
             (id, external_id, amount, currency, reference_text, transacted_on, \
              matched_obligation, matched, imported_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(*record.id.as_uuid())
        .bind(&record.external_id)
        .bind(record.amount.amount())
        .bind(record.amount.currency().code())
        .bind(&record.reference_text)
        .bind(record.transacted_on)
        .bind(record.matched_obligation.map(|o| *o.as_uuid()))
        .bind(record.matched)
        .bind(record.imported_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn record(&self, id: BankRecordId) -> Result<BankTransactionRecord, StoreError> {
        let row = sqlx::query(
            "SELECT id, external_id, amount, currency, reference_text, transacted_on, \
             matched_obligation, matched, imported_at \
             FROM bank_transaction_records WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::not_found("bank record", id))?;

        bank_record_from_row(&row)
    }

    async fn mark_matched(
        &self,
        id: BankRecordId,
        obligation: ObligationId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE bank_transaction_records \
             SET matched = TRUE, matched_obligation = $2 \
             WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .bind(*obligation.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("bank record", id));
        }
        Ok(())
    }

    async fn unmatched_records(&self) -> Result<Vec<BankTransactionRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, external_id, amount, currency, reference_text, transacted_on, \
             matched_obligation, matched, imported_at \
             FROM bank_transaction_records WHERE matched = FALSE ORDER BY imported_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(bank_record_from_row).collect()
    }
}
