//! HTTP handlers for purchase order endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use shared::models::{
    CreatePurchaseOrderInput, PurchaseOrder, SetArrivalInput, UpdatePurchaseOrderInput,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::PurchaseOrderService;
use crate::AppState;

fn service(state: &AppState) -> PurchaseOrderService {
    PurchaseOrderService::new(&state.stores, state.notifier.clone())
}

/// Create a purchase order
pub async fn create_purchase_order(
    State(state): State<AppState>,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> AppResult<Json<PurchaseOrder>> {
    let order = service(&state).create(input).await?;
    Ok(Json(order))
}

/// Update a purchase order
pub async fn update_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdatePurchaseOrderInput>,
) -> AppResult<Json<PurchaseOrder>> {
    let order = service(&state).update(order_id, input).await?;
    Ok(Json(order))
}

/// Mark several purchase orders arrived or not arrived
pub async fn set_purchase_order_arrival(
    State(state): State<AppState>,
    Json(input): Json<SetArrivalInput>,
) -> AppResult<Json<Vec<PurchaseOrder>>> {
    let orders = service(&state).set_arrival(input).await?;
    Ok(Json(orders))
}

/// Delete a purchase order
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    service(&state).delete(order_id).await?;
    Ok(Json(()))
}

/// Delete every purchase order placed with a vendor
pub async fn delete_vendor_purchase_orders(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> AppResult<Json<u64>> {
    let deleted = service(&state).delete_by_vendor(vendor_id).await?;
    Ok(Json(deleted))
}
