//! Purchase order service
//!
//! Every committed write publishes a change event so material inventory is
//! recomputed.

use std::sync::Arc;

use chrono::Utc;
use shared::models::{
    CreatePurchaseOrderInput, PurchaseOrder, SetArrivalInput, UpdatePurchaseOrderInput,
};
use shared::types::MaterialScope;
use shared::validation::{validate_note, validate_order_quantity};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::triggers::{ChangeEvent, ChangeNotifier, ChangeOperation, ChangeSource};
use crate::stores::{MaterialStore, PurchaseOrderStore, Stores};

/// Purchase order service
#[derive(Clone)]
pub struct PurchaseOrderService {
    materials: Arc<dyn MaterialStore>,
    orders: Arc<dyn PurchaseOrderStore>,
    notifier: Arc<ChangeNotifier>,
}

impl PurchaseOrderService {
    pub fn new(stores: &Stores, notifier: Arc<ChangeNotifier>) -> Self {
        Self {
            materials: stores.materials.clone(),
            orders: stores.orders.clone(),
            notifier,
        }
    }

    /// Create a purchase order
    pub async fn create(&self, input: CreatePurchaseOrderInput) -> AppResult<PurchaseOrder> {
        validate_order_quantity(input.quantity)
            .map_err(|msg| AppError::validation("quantity", msg))?;
        if let Some(notes) = &input.notes {
            validate_note(notes).map_err(|msg| AppError::validation("notes", msg))?;
        }
        self.ensure_material(input.material_id).await?;

        let now = Utc::now();
        let mut order = PurchaseOrder {
            id: Uuid::new_v4(),
            material_id: Some(input.material_id),
            vendor_id: input.vendor_id,
            quantity: Some(input.quantity),
            has_arrived: false,
            arrival_date: None,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        order.set_arrival(input.has_arrived, input.arrival_date, now.date_naive());
        self.orders.insert_order(&order).await?;

        self.publish(
            ChangeOperation::Created,
            MaterialScope::materials(order.material_id),
        )
        .await;

        Ok(order)
    }

    /// Update a purchase order
    pub async fn update(
        &self,
        order_id: Uuid,
        input: UpdatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrder> {
        let existing = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        if let Some(quantity) = input.quantity {
            validate_order_quantity(quantity)
                .map_err(|msg| AppError::validation("quantity", msg))?;
        }
        if let Some(notes) = &input.notes {
            validate_note(notes).map_err(|msg| AppError::validation("notes", msg))?;
        }
        if let Some(material_id) = input.material_id {
            self.ensure_material(material_id).await?;
        }

        let now = Utc::now();
        let mut order = PurchaseOrder {
            material_id: input.material_id.or(existing.material_id),
            vendor_id: input.vendor_id.or(existing.vendor_id),
            quantity: input.quantity.or(existing.quantity),
            notes: input.notes.or_else(|| existing.notes.clone()),
            updated_at: now,
            ..existing.clone()
        };
        match (input.has_arrived, input.arrival_date) {
            (Some(has_arrived), arrival_date) => {
                order.set_arrival(has_arrived, arrival_date.flatten(), now.date_naive())
            }
            (None, Some(arrival_date)) => order.arrival_date = arrival_date,
            (None, None) => {}
        }

        if !self.orders.update_order(&order).await? {
            return Err(AppError::NotFound("Purchase order".to_string()));
        }

        // Moving an order changes both the old and the new material
        self.publish(
            ChangeOperation::Updated,
            MaterialScope::materials(existing.material_id.into_iter().chain(order.material_id)),
        )
        .await;

        Ok(order)
    }

    /// Mark several orders arrived or not arrived
    pub async fn set_arrival(&self, input: SetArrivalInput) -> AppResult<Vec<PurchaseOrder>> {
        if input.order_ids.is_empty() {
            return Err(AppError::validation(
                "order_ids",
                "At least one order id is required",
            ));
        }

        let updated = self
            .orders
            .set_arrival(&input.order_ids, input.has_arrived, input.arrival_date)
            .await?;

        self.publish(
            ChangeOperation::BulkUpdated,
            MaterialScope::materials(updated.iter().filter_map(|order| order.material_id)),
        )
        .await;

        Ok(updated)
    }

    /// Delete a purchase order
    pub async fn delete(&self, order_id: Uuid) -> AppResult<()> {
        let deleted = self
            .orders
            .delete_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        self.publish(
            ChangeOperation::Deleted,
            MaterialScope::materials(deleted.material_id),
        )
        .await;

        Ok(())
    }

    /// Delete every order placed with a vendor
    pub async fn delete_by_vendor(&self, vendor_id: Uuid) -> AppResult<u64> {
        let deleted = self.orders.delete_orders_by_vendor(vendor_id).await?;

        // The affected materials are not known without another query
        if deleted > 0 {
            self.publish(ChangeOperation::BulkDeleted, MaterialScope::All)
                .await;
        }

        Ok(deleted)
    }

    async fn ensure_material(&self, material_id: Uuid) -> AppResult<()> {
        match self.materials.get_material(material_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Material".to_string())),
        }
    }

    async fn publish(&self, operation: ChangeOperation, scope: MaterialScope) {
        self.notifier
            .notify(ChangeEvent::new(ChangeSource::PurchaseOrder, operation, scope))
            .await;
    }
}
