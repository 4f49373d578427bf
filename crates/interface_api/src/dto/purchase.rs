//! Purchase and obligation DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_settlement::{LedgerOverview, PaymentObligation, SettlementOutcome};

#[derive(Debug, Deserialize)]
pub struct RecordPurchaseRequest {
    /// Owning group; omit for a personal purchase
    pub group_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub purchased_on: NaiveDate,
    /// Ordered; earlier participants absorb any remainder units
    pub participants: Vec<Uuid>,
    pub location: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkPaidRequest {
    /// Who confirmed receipt of the money, when known
    pub confirmed_by: Option<Uuid>,
}

/// Money amounts in responses are fixed-point strings ("33.34") so clients
/// never see scale drift between a fresh zero and a computed total.
#[derive(Debug, Serialize)]
pub struct ObligationResponse {
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub participant_id: Uuid,
    pub amount: String,
    pub currency: String,
    pub status: String,
    pub reference: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub id: Uuid,
    pub group_id: Option<Uuid>,
    pub total: String,
    pub currency: String,
    pub collected_total: String,
    pub outstanding: String,
    pub fully_paid: bool,
    pub purchased_on: NaiveDate,
    pub location: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub obligations: Vec<ObligationResponse>,
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub obligation: ObligationResponse,
    pub collected_total: String,
    pub outstanding: String,
    pub fully_paid: bool,
}

#[derive(Debug, Serialize)]
pub struct DescriptorResponse {
    pub obligation_id: Uuid,
    pub descriptor: String,
}

impl From<&PaymentObligation> for ObligationResponse {
    fn from(o: &PaymentObligation) -> Self {
        Self {
            id: *o.id.as_uuid(),
            ledger_id: *o.ledger_id.as_uuid(),
            participant_id: *o.participant.as_uuid(),
            amount: o.amount.fixed_point(),
            currency: o.amount.currency().code().to_string(),
            status: o.status.as_str().to_string(),
            reference: o.reference.as_str().to_string(),
            paid_at: o.paid_at,
            confirmed_by: o.confirmed_by.map(|p| *p.as_uuid()),
        }
    }
}

impl From<LedgerOverview> for LedgerResponse {
    fn from(overview: LedgerOverview) -> Self {
        let ledger = overview.ledger;
        Self {
            id: *ledger.id.as_uuid(),
            group_id: ledger.group_id.map(|g| *g.as_uuid()),
            total: ledger.total.fixed_point(),
            currency: ledger.currency().code().to_string(),
            collected_total: ledger.collected_total.fixed_point(),
            outstanding: overview.outstanding.fixed_point(),
            fully_paid: ledger.fully_paid,
            purchased_on: ledger.purchased_on,
            location: ledger.location,
            note: ledger.note,
            created_at: ledger.created_at,
            obligations: overview.obligations.iter().map(Into::into).collect(),
        }
    }
}

impl From<SettlementOutcome> for SettlementResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        Self {
            obligation: (&outcome.obligation).into(),
            collected_total: outcome.ledger.collected_total.fixed_point(),
            outstanding: outcome.ledger.outstanding_balance().fixed_point(),
            fully_paid: outcome.ledger.fully_paid,
        }
    }
}
