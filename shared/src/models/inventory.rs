//! Inventory snapshot models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Denormalized stock position stored on a material.
///
/// Derived entirely from purchase orders and length adjustments; it holds no
/// state of its own and may be rebuilt at any time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InventorySnapshot {
    /// Ordered length across arrived orders
    pub length_arrived: Decimal,
    /// Ordered length across orders still in transit
    pub length_not_arrived: Decimal,
    /// Net signed sum of all length adjustments
    pub sum_of_length_adjustments: Decimal,
    /// `length_arrived + sum_of_length_adjustments`
    pub net_length_available: Decimal,
    /// Purchase orders that contributed to the figures above
    pub material_orders: Vec<Uuid>,
    /// Adjustments that contributed to `sum_of_length_adjustments`
    pub length_adjustments: Vec<Uuid>,
}

/// Per-material adjustment total
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdjustmentAggregate {
    pub sum: Decimal,
    pub adjustment_ids: Vec<Uuid>,
}

/// One entry of a bulk inventory write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryUpdate {
    pub material_id: Uuid,
    pub inventory: InventorySnapshot,
}
