//! In-memory store
//!
//! Keeps records in insertion order and supports failure injection and
//! artificial latency, so reconciliation behavior can be exercised without a
//! database.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use shared::models::{InventoryUpdate, LengthAdjustment, Material, PurchaseOrder};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LengthAdjustmentStore, MaterialStore, PurchaseOrderStore, StoreError, StoreResult};

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    ListMaterials,
    ListOrders,
    ListAdjustments,
    BulkUpdateInventory,
}

/// In-memory implementation of every store trait
#[derive(Default)]
pub struct MemoryStore {
    materials: RwLock<Vec<Material>>,
    orders: RwLock<Vec<PurchaseOrder>>,
    adjustments: RwLock<Vec<LengthAdjustment>>,
    failures: RwLock<HashSet<StoreOperation>>,
    load_delay: RwLock<Option<Duration>>,
    /// Every bulk inventory write received, in order
    inventory_writes: RwLock<Vec<Vec<InventoryUpdate>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `operation` fail (or succeed again) on subsequent calls
    pub async fn set_failure(&self, operation: StoreOperation, fail: bool) {
        let mut failures = self.failures.write().await;
        if fail {
            failures.insert(operation);
        } else {
            failures.remove(&operation);
        }
    }

    /// Delay every list operation by `delay`
    pub async fn set_load_delay(&self, delay: Option<Duration>) {
        *self.load_delay.write().await = delay;
    }

    pub async fn insert_material(&self, material: Material) {
        self.materials.write().await.push(material);
    }

    pub async fn material(&self, id: Uuid) -> Option<Material> {
        self.materials
            .read()
            .await
            .iter()
            .find(|material| material.id == id)
            .cloned()
    }

    /// Number of bulk inventory writes issued so far
    pub async fn inventory_write_count(&self) -> usize {
        self.inventory_writes.read().await.len()
    }

    /// Take the recorded bulk inventory writes
    pub async fn take_inventory_writes(&self) -> Vec<Vec<InventoryUpdate>> {
        std::mem::take(&mut *self.inventory_writes.write().await)
    }

    async fn check(&self, operation: StoreOperation) -> StoreResult<()> {
        if self.failures.read().await.contains(&operation) {
            return Err(StoreError::Unavailable(format!(
                "injected failure on {:?}",
                operation
            )));
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        let delay = *self.load_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn in_scope(material_id: Option<Uuid>, material_ids: Option<&[Uuid]>) -> bool {
    match material_ids {
        None => true,
        Some(ids) => material_id.is_some_and(|id| ids.contains(&id)),
    }
}

#[async_trait]
impl MaterialStore for MemoryStore {
    async fn list_materials(&self, material_ids: Option<&[Uuid]>) -> StoreResult<Vec<Material>> {
        self.simulate_latency().await;
        self.check(StoreOperation::ListMaterials).await?;

        Ok(self
            .materials
            .read()
            .await
            .iter()
            .filter(|material| in_scope(Some(material.id), material_ids))
            .cloned()
            .collect())
    }

    async fn get_material(&self, id: Uuid) -> StoreResult<Option<Material>> {
        Ok(self.material(id).await)
    }

    async fn bulk_update_inventory(&self, updates: &[InventoryUpdate]) -> StoreResult<u64> {
        self.check(StoreOperation::BulkUpdateInventory).await?;

        let mut materials = self.materials.write().await;
        let mut written = 0;
        for update in updates {
            if let Some(material) = materials.iter_mut().find(|m| m.id == update.material_id) {
                material.inventory = update.inventory.clone();
                written += 1;
            }
        }
        self.inventory_writes.write().await.push(updates.to_vec());

        Ok(written)
    }
}

#[async_trait]
impl PurchaseOrderStore for MemoryStore {
    async fn list_orders_for_materials(
        &self,
        material_ids: Option<&[Uuid]>,
    ) -> StoreResult<Vec<PurchaseOrder>> {
        self.simulate_latency().await;
        self.check(StoreOperation::ListOrders).await?;

        Ok(self
            .orders
            .read()
            .await
            .iter()
            .filter(|order| in_scope(order.material_id, material_ids))
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .find(|order| order.id == id)
            .cloned())
    }

    async fn insert_order(&self, order: &PurchaseOrder) -> StoreResult<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn update_order(&self, order: &PurchaseOrder) -> StoreResult<bool> {
        let mut orders = self.orders.write().await;
        match orders.iter_mut().find(|existing| existing.id == order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_arrival(
        &self,
        order_ids: &[Uuid],
        has_arrived: bool,
        arrival_date: Option<NaiveDate>,
    ) -> StoreResult<Vec<PurchaseOrder>> {
        let mut orders = self.orders.write().await;
        let mut updated = Vec::new();
        let now = Utc::now();
        for order in orders.iter_mut().filter(|order| order_ids.contains(&order.id)) {
            order.set_arrival(has_arrived, arrival_date, now.date_naive());
            order.updated_at = now;
            updated.push(order.clone());
        }
        Ok(updated)
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>> {
        let mut orders = self.orders.write().await;
        Ok(orders
            .iter()
            .position(|order| order.id == id)
            .map(|index| orders.remove(index)))
    }

    async fn delete_orders_by_vendor(&self, vendor_id: Uuid) -> StoreResult<u64> {
        let mut orders = self.orders.write().await;
        let before = orders.len();
        orders.retain(|order| order.vendor_id != Some(vendor_id));
        Ok((before - orders.len()) as u64)
    }
}

#[async_trait]
impl LengthAdjustmentStore for MemoryStore {
    async fn list_adjustments(
        &self,
        material_ids: Option<&[Uuid]>,
    ) -> StoreResult<Vec<LengthAdjustment>> {
        self.simulate_latency().await;
        self.check(StoreOperation::ListAdjustments).await?;

        Ok(self
            .adjustments
            .read()
            .await
            .iter()
            .filter(|adjustment| in_scope(adjustment.material_id, material_ids))
            .cloned()
            .collect())
    }

    async fn get_adjustment(&self, id: Uuid) -> StoreResult<Option<LengthAdjustment>> {
        Ok(self
            .adjustments
            .read()
            .await
            .iter()
            .find(|adjustment| adjustment.id == id)
            .cloned())
    }

    async fn insert_adjustment(&self, adjustment: &LengthAdjustment) -> StoreResult<()> {
        self.adjustments.write().await.push(adjustment.clone());
        Ok(())
    }

    async fn update_adjustment(&self, adjustment: &LengthAdjustment) -> StoreResult<bool> {
        let mut adjustments = self.adjustments.write().await;
        match adjustments
            .iter_mut()
            .find(|existing| existing.id == adjustment.id)
        {
            Some(existing) => {
                *existing = adjustment.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_adjustment(&self, id: Uuid) -> StoreResult<Option<LengthAdjustment>> {
        let mut adjustments = self.adjustments.write().await;
        Ok(adjustments
            .iter()
            .position(|adjustment| adjustment.id == id)
            .map(|index| adjustments.remove(index)))
    }

    async fn delete_adjustments_for_material(&self, material_id: Uuid) -> StoreResult<u64> {
        let mut adjustments = self.adjustments.write().await;
        let before = adjustments.len();
        adjustments.retain(|adjustment| adjustment.material_id != Some(material_id));
        Ok((before - adjustments.len()) as u64)
    }
}
