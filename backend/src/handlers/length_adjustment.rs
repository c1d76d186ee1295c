//! HTTP handlers for length adjustment endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use shared::models::{
    CreateLengthAdjustmentInput, LengthAdjustment, UpdateLengthAdjustmentInput,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::LengthAdjustmentService;
use crate::AppState;

/// Record a length adjustment
pub async fn create_length_adjustment(
    State(state): State<AppState>,
    Json(input): Json<CreateLengthAdjustmentInput>,
) -> AppResult<Json<LengthAdjustment>> {
    let service = LengthAdjustmentService::new(&state.stores, state.notifier.clone());
    let adjustment = service.create(input).await?;
    Ok(Json(adjustment))
}

/// Edit a length adjustment
pub async fn update_length_adjustment(
    State(state): State<AppState>,
    Path(adjustment_id): Path<Uuid>,
    Json(input): Json<UpdateLengthAdjustmentInput>,
) -> AppResult<Json<LengthAdjustment>> {
    let service = LengthAdjustmentService::new(&state.stores, state.notifier.clone());
    let adjustment = service.update(adjustment_id, input).await?;
    Ok(Json(adjustment))
}

/// Delete a length adjustment
pub async fn delete_length_adjustment(
    State(state): State<AppState>,
    Path(adjustment_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = LengthAdjustmentService::new(&state.stores, state.notifier.clone());
    service.delete(adjustment_id).await?;
    Ok(Json(()))
}

/// Delete every adjustment of a material
pub async fn delete_material_length_adjustments(
    State(state): State<AppState>,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<u64>> {
    let service = LengthAdjustmentService::new(&state.stores, state.notifier.clone());
    let deleted = service.delete_for_material(material_id).await?;
    Ok(Json(deleted))
}
