//! Bank import DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_bank::BankTransactionRecord;

#[derive(Debug, Deserialize)]
pub struct ImportTransactionRequest {
    /// Unique id from the bank export; re-imports of the same id conflict
    pub external_id: String,
    pub amount: Decimal,
    pub currency: String,
    /// Free-text payment message that may carry a settlement reference
    pub reference_text: String,
    pub transacted_on: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct BankRecordResponse {
    pub id: Uuid,
    pub external_id: String,
    pub amount: String,
    pub currency: String,
    pub reference_text: String,
    pub transacted_on: NaiveDate,
    pub matched: bool,
    pub matched_obligation: Option<Uuid>,
    pub imported_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RematchResponse {
    /// How many previously unmatched records this sweep linked
    pub matched: usize,
}

impl From<BankTransactionRecord> for BankRecordResponse {
    fn from(record: BankTransactionRecord) -> Self {
        Self {
            id: *record.id.as_uuid(),
            external_id: record.external_id,
            amount: record.amount.fixed_point(),
            currency: record.amount.currency().code().to_string(),
            reference_text: record.reference_text,
            transacted_on: record.transacted_on,
            matched: record.matched,
            matched_obligation: record.matched_obligation.map(|o| *o.as_uuid()),
            imported_at: record.imported_at,
        }
    }
}
