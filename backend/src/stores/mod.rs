//! Persistence interfaces used by the inventory engine and the mutation services
//!
//! Each collection is an async trait so the engine can run against Postgres
//! in production and against [`MemoryStore`] in tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{InventoryUpdate, LengthAdjustment, Material, PurchaseOrder};
use shared::reconciliation::{aggregate_adjustments, AdjustmentAggregation};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryStore, StoreOperation};
pub use postgres::PgStore;

/// Errors raised by store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Material catalog access
#[async_trait]
pub trait MaterialStore: Send + Sync {
    /// List materials, optionally restricted to `material_ids`
    async fn list_materials(&self, material_ids: Option<&[Uuid]>) -> StoreResult<Vec<Material>>;

    async fn get_material(&self, id: Uuid) -> StoreResult<Option<Material>>;

    /// Replace the `inventory` field of each listed material in one write.
    /// No other material field is touched. Returns the number of materials updated.
    async fn bulk_update_inventory(&self, updates: &[InventoryUpdate]) -> StoreResult<u64>;
}

/// Purchase order access
#[async_trait]
pub trait PurchaseOrderStore: Send + Sync {
    /// Orders referencing `material_ids`, or every order when `None`
    async fn list_orders_for_materials(
        &self,
        material_ids: Option<&[Uuid]>,
    ) -> StoreResult<Vec<PurchaseOrder>>;

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>>;

    async fn insert_order(&self, order: &PurchaseOrder) -> StoreResult<()>;

    /// Returns false when the order does not exist
    async fn update_order(&self, order: &PurchaseOrder) -> StoreResult<bool>;

    /// Set the arrival status of several orders, returning the updated orders.
    /// `arrival_date` follows [`PurchaseOrder::set_arrival`].
    async fn set_arrival(
        &self,
        order_ids: &[Uuid],
        has_arrived: bool,
        arrival_date: Option<NaiveDate>,
    ) -> StoreResult<Vec<PurchaseOrder>>;

    /// Returns the deleted order, if it existed
    async fn delete_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>>;

    /// Delete every order placed with a vendor, returning the number deleted
    async fn delete_orders_by_vendor(&self, vendor_id: Uuid) -> StoreResult<u64>;
}

/// Length adjustment access
#[async_trait]
pub trait LengthAdjustmentStore: Send + Sync {
    /// Adjustments referencing `material_ids`, or every adjustment when `None`
    async fn list_adjustments(
        &self,
        material_ids: Option<&[Uuid]>,
    ) -> StoreResult<Vec<LengthAdjustment>>;

    /// Per-material adjustment totals
    async fn aggregate_adjustments_by_material(
        &self,
        material_ids: Option<&[Uuid]>,
    ) -> StoreResult<AdjustmentAggregation> {
        let adjustments = self.list_adjustments(material_ids).await?;
        Ok(aggregate_adjustments(&adjustments))
    }

    async fn get_adjustment(&self, id: Uuid) -> StoreResult<Option<LengthAdjustment>>;

    async fn insert_adjustment(&self, adjustment: &LengthAdjustment) -> StoreResult<()>;

    /// Returns false when the adjustment does not exist
    async fn update_adjustment(&self, adjustment: &LengthAdjustment) -> StoreResult<bool>;

    /// Returns the deleted adjustment, if it existed
    async fn delete_adjustment(&self, id: Uuid) -> StoreResult<Option<LengthAdjustment>>;

    /// Delete every adjustment of a material, returning the number deleted
    async fn delete_adjustments_for_material(&self, material_id: Uuid) -> StoreResult<u64>;
}

/// The store handles wired into services
#[derive(Clone)]
pub struct Stores {
    pub materials: Arc<dyn MaterialStore>,
    pub orders: Arc<dyn PurchaseOrderStore>,
    pub adjustments: Arc<dyn LengthAdjustmentStore>,
}

impl Stores {
    /// All collections backed by one Postgres pool
    pub fn postgres(db: sqlx::PgPool) -> Self {
        let store = Arc::new(PgStore::new(db));
        Self {
            materials: store.clone(),
            orders: store.clone(),
            adjustments: store,
        }
    }

    /// All collections backed by one in-memory store
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            materials: store.clone(),
            orders: store.clone(),
            adjustments: store,
        }
    }
}
