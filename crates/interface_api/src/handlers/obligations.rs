//! Obligation settlement handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use core_kernel::{ObligationId, ParticipantId};
use domain_bank::DescriptorService;
use domain_settlement::{ReconciliationService, SettlementStore};

use crate::dto::purchase::{DescriptorResponse, MarkPaidRequest, SettlementResponse};
use crate::{error::ApiError, AppState};

/// Marks an obligation paid; a second attempt surfaces as 409
pub async fn mark_paid<S: SettlementStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Json(request): Json<MarkPaidRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let outcome = ReconciliationService::new(state.store.clone())
        .mark_paid(
            ObligationId::from_uuid(id),
            request.confirmed_by.map(ParticipantId::from_uuid),
        )
        .await?;

    Ok(Json(outcome.into()))
}

/// Marks an obligation failed
pub async fn mark_failed<S: SettlementStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let outcome = ReconciliationService::new(state.store.clone())
        .mark_failed(ObligationId::from_uuid(id))
        .await?;

    Ok(Json(outcome.into()))
}

/// Refunds a paid obligation
pub async fn mark_refunded<S: SettlementStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let outcome = ReconciliationService::new(state.store.clone())
        .mark_refunded(ObligationId::from_uuid(id))
        .await?;

    Ok(Json(outcome.into()))
}

/// Returns the obligation's payment descriptor, rendering it on first use
pub async fn get_descriptor<S: SettlementStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DescriptorResponse>, ApiError> {
    let descriptor = DescriptorService::new(state.store.clone(), state.config.recipient())
        .descriptor_for(ObligationId::from_uuid(id))
        .await?;

    Ok(Json(DescriptorResponse {
        obligation_id: id,
        descriptor,
    }))
}
