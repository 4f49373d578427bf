//! Bank import handlers
//!
//! Matching is advisory: imports link records to obligations but never
//! settle anything. Settlement stays an explicit call on the obligation.

use axum::{extract::State, http::StatusCode, Json};

use core_kernel::{Currency, Money};
use domain_bank::{BankImportStore, BankMatcher, BankTransactionRecord};
use domain_settlement::SettlementStore;

use crate::dto::bank::{BankRecordResponse, ImportTransactionRequest, RematchResponse};
use crate::{error::ApiError, AppState};

/// Imports a bank transaction and attempts to match it immediately
pub async fn import_transaction<S: SettlementStore + BankImportStore + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<ImportTransactionRequest>,
) -> Result<(StatusCode, Json<BankRecordResponse>), ApiError> {
    let currency: Currency = request.currency.parse()?;
    let amount = Money::new(request.amount, currency)?;

    let record = BankMatcher::new(state.store.clone())
        .import(BankTransactionRecord::imported(
            request.external_id,
            amount,
            request.reference_text,
            request.transacted_on,
        ))
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Lists records no import or sweep has matched yet
pub async fn list_unmatched<S: SettlementStore + BankImportStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<BankRecordResponse>>, ApiError> {
    let records = state.store.unmatched_records().await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Re-runs matching over unmatched records against current obligations
pub async fn rematch<S: SettlementStore + BankImportStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<RematchResponse>, ApiError> {
    let matched = BankMatcher::new(state.store.clone())
        .rematch_unmatched()
        .await?;

    Ok(Json(RematchResponse { matched }))
}
