//! HTTP handlers for material inventory endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use shared::models::InventorySnapshot;
use shared::types::MaterialScope;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::RecomputeSummary;
use crate::stores::MaterialStore;
use crate::AppState;

/// Request body for a manual recompute. Omit `material_ids` to rebuild every material.
#[derive(Debug, Default, Deserialize)]
pub struct RecomputeRequest {
    #[serde(default)]
    pub material_ids: Option<Vec<Uuid>>,
}

/// Recompute material inventory. A request without a body rebuilds every material.
pub async fn recompute_inventory(
    State(state): State<AppState>,
    request: Option<Json<RecomputeRequest>>,
) -> AppResult<Json<RecomputeSummary>> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let scope = MaterialScope::from(request.material_ids);
    let summary = state.inventory.recompute_scope(&scope).await?;
    Ok(Json(summary))
}

/// Get the stored inventory snapshot of a material
pub async fn get_material_inventory(
    State(state): State<AppState>,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<InventorySnapshot>> {
    let material = state
        .stores
        .materials
        .get_material(material_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Material".to_string()))?;
    Ok(Json(material.inventory))
}
