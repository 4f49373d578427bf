//! Purchase handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::{Currency, GroupId, LedgerId, Money, ParticipantId};
use domain_settlement::{NewPurchase, PurchaseService, SettlementStore};

use crate::dto::purchase::{LedgerResponse, RecordPurchaseRequest};
use crate::{error::ApiError, AppState};

/// Records a purchase and its split obligation set
pub async fn record_purchase<S: SettlementStore + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<RecordPurchaseRequest>,
) -> Result<(StatusCode, Json<LedgerResponse>), ApiError> {
    let currency: Currency = request.currency.parse()?;
    let total = Money::new(request.amount, currency)?;

    let purchase = NewPurchase {
        group_id: request.group_id.map(GroupId::from_uuid),
        total,
        purchased_on: request.purchased_on,
        participants: request
            .participants
            .into_iter()
            .map(ParticipantId::from_uuid)
            .collect(),
        location: request.location,
        note: request.note,
    };

    let overview = PurchaseService::new(state.store.clone())
        .create_with_split(purchase)
        .await?;

    Ok((StatusCode::CREATED, Json(overview.into())))
}

/// Fetches a purchase ledger with its obligations and outstanding balance
pub async fn get_purchase<S: SettlementStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<LedgerResponse>, ApiError> {
    let overview = PurchaseService::new(state.store.clone())
        .ledger_overview(LedgerId::from_uuid(id))
        .await?;

    Ok(Json(overview.into()))
}
