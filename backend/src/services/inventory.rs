//! Inventory reconciliation service
//!
//! Rebuilds the denormalized inventory snapshot of materials from their
//! purchase orders and length adjustments, and writes every snapshot back in
//! one bulk update.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use shared::models::InventoryUpdate;
use shared::reconciliation::{build_snapshot, group_orders_by_material, ArrivalPredicate, ArrivedFlag};
use shared::types::MaterialScope;
use uuid::Uuid;

use crate::config::InventoryConfig;
use crate::error::{InventoryError, LoadStep};
use crate::services::triggers::{ChangeEvent, ChangeListener};
use crate::stores::{LengthAdjustmentStore, MaterialStore, PurchaseOrderStore, StoreResult, Stores};

const DEFAULT_RECOMPUTE_TIMEOUT: Duration = Duration::from_secs(60);

/// Inventory service owning the reconciliation pipeline
#[derive(Clone)]
pub struct InventoryService {
    materials: Arc<dyn MaterialStore>,
    orders: Arc<dyn PurchaseOrderStore>,
    adjustments: Arc<dyn LengthAdjustmentStore>,
    arrival: Arc<dyn ArrivalPredicate>,
    timeout: Duration,
}

/// Outcome of one recompute
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecomputeSummary {
    /// Materials whose snapshot was rebuilt
    pub materials: usize,
    /// Materials the store reported as written
    pub written: u64,
    /// Orders left out because their material reference is missing or unknown
    pub skipped_orders: Vec<Uuid>,
    /// Adjustments left out because their material reference is missing or unknown
    pub skipped_adjustments: Vec<Uuid>,
    pub elapsed_ms: u64,
}

impl InventoryService {
    /// Create a new InventoryService using the arrival flag rule
    pub fn new(stores: &Stores) -> Self {
        Self {
            materials: stores.materials.clone(),
            orders: stores.orders.clone(),
            adjustments: stores.adjustments.clone(),
            arrival: Arc::new(ArrivedFlag),
            timeout: DEFAULT_RECOMPUTE_TIMEOUT,
        }
    }

    pub fn from_config(stores: &Stores, config: &InventoryConfig) -> Self {
        Self::new(stores)
            .with_arrival_predicate(config.arrival_rule.predicate())
            .with_timeout(config.recompute_timeout())
    }

    pub fn with_arrival_predicate(mut self, arrival: Arc<dyn ArrivalPredicate>) -> Self {
        self.arrival = arrival;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Recompute the inventory of `material_ids`, or of every material when `None`
    pub async fn recompute(
        &self,
        material_ids: Option<&[Uuid]>,
    ) -> Result<RecomputeSummary, InventoryError> {
        let scope = MaterialScope::from(material_ids.map(<[Uuid]>::to_vec));
        self.recompute_scope(&scope).await
    }

    /// Recompute the inventory of every material in `scope`
    pub async fn recompute_scope(
        &self,
        scope: &MaterialScope,
    ) -> Result<RecomputeSummary, InventoryError> {
        let started = Instant::now();

        let mut summary = match tokio::time::timeout(self.timeout, self.reconcile(scope)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!(
                    scope = ?scope,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Inventory recompute timed out"
                );
                return Err(InventoryError::Timeout(self.timeout));
            }
        };

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            materials = summary.materials,
            written = summary.written,
            skipped_orders = summary.skipped_orders.len(),
            skipped_adjustments = summary.skipped_adjustments.len(),
            elapsed_ms = summary.elapsed_ms,
            "Inventory recomputed"
        );

        Ok(summary)
    }

    async fn reconcile(&self, scope: &MaterialScope) -> Result<RecomputeSummary, InventoryError> {
        if scope.is_empty() {
            tracing::debug!("Empty material scope, nothing to recompute");
            return Ok(RecomputeSummary::default());
        }

        let filter = scope.as_filter();
        let (materials, orders, adjustments) = tokio::try_join!(
            load(LoadStep::Materials, self.materials.list_materials(filter)),
            load(
                LoadStep::PurchaseOrders,
                self.orders.list_orders_for_materials(filter)
            ),
            load(
                LoadStep::LengthAdjustments,
                self.adjustments.aggregate_adjustments_by_material(filter)
            ),
        )?;

        let known: HashSet<Uuid> = materials.iter().map(|material| material.id).collect();
        let grouping = group_orders_by_material(&orders);

        let mut skipped_orders = grouping.skipped.clone();
        for (material_id, material_orders) in &grouping.by_material {
            if !known.contains(material_id) {
                skipped_orders.extend(material_orders.iter().map(|order| order.id));
            }
        }
        skipped_orders.sort();

        let mut skipped_adjustments = adjustments.skipped.clone();
        for (material_id, aggregate) in &adjustments.by_material {
            if !known.contains(material_id) {
                skipped_adjustments.extend(aggregate.adjustment_ids.iter().copied());
            }
        }
        skipped_adjustments.sort();

        if !skipped_orders.is_empty() {
            tracing::warn!(
                count = skipped_orders.len(),
                order_ids = ?skipped_orders,
                "Skipping purchase orders without a valid material reference"
            );
        }
        if !skipped_adjustments.is_empty() {
            tracing::warn!(
                count = skipped_adjustments.len(),
                adjustment_ids = ?skipped_adjustments,
                "Skipping length adjustments without a valid material reference"
            );
        }

        // One evaluation date for every material in this run
        let pinned = self.arrival.pinned();
        let arrival = pinned.as_deref().unwrap_or(self.arrival.as_ref());

        let updates: Vec<InventoryUpdate> = materials
            .iter()
            .map(|material| InventoryUpdate {
                material_id: material.id,
                inventory: build_snapshot(
                    grouping.orders_for(&material.id).iter().copied(),
                    adjustments.get(&material.id),
                    arrival,
                ),
            })
            .collect();

        let written = if updates.is_empty() {
            0
        } else {
            self.materials
                .bulk_update_inventory(&updates)
                .await
                .map_err(|e| {
                    tracing::error!(
                        materials = updates.len(),
                        error = %e,
                        "Failed to write inventory snapshots"
                    );
                    InventoryError::PersistenceWrite(e)
                })?
        };

        Ok(RecomputeSummary {
            materials: updates.len(),
            written,
            skipped_orders,
            skipped_adjustments,
            elapsed_ms: 0,
        })
    }
}

/// Await one source load, tagging a failure with the step that failed
async fn load<T>(
    step: LoadStep,
    future: impl Future<Output = StoreResult<T>>,
) -> Result<T, InventoryError> {
    future.await.map_err(|source| {
        tracing::error!(step = %step, error = %source, "Failed to load inventory source data");
        InventoryError::SourceLoad { step, source }
    })
}

#[async_trait]
impl ChangeListener for InventoryService {
    fn name(&self) -> &str {
        "inventory"
    }

    async fn on_change(&self, event: &ChangeEvent) -> Result<(), InventoryError> {
        tracing::debug!(
            source = ?event.source,
            operation = ?event.operation,
            scope = ?event.scope,
            "Recomputing inventory after change"
        );
        self.recompute_scope(&event.scope).await.map(|_| ())
    }
}
