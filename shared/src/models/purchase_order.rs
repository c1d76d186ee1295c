//! Purchase order models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A vendor order for a quantity of one material
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseOrder {
    pub id: Uuid,
    /// Ordered material. `None` for records imported without a valid reference.
    pub material_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    /// Ordered length. Missing quantities count as zero.
    pub quantity: Option<Decimal>,
    pub has_arrived: bool,
    pub arrival_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// Build a new, not yet arrived order
    pub fn new(material_id: Uuid, quantity: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            material_id: Some(material_id),
            vendor_id: None,
            quantity: Some(quantity),
            has_arrived: false,
            arrival_date: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn arrived(mut self, has_arrived: bool) -> Self {
        self.has_arrived = has_arrived;
        self
    }

    pub fn with_vendor(mut self, vendor_id: Uuid) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    pub fn with_arrival_date(mut self, date: NaiveDate) -> Self {
        self.arrival_date = Some(date);
        self
    }

    /// Set the arrival status and keep `arrival_date` in step with it.
    ///
    /// An explicit date always wins. Marking an order arrived without a date
    /// keeps the known date or falls back to `today`; marking it not arrived
    /// without a date clears the date.
    pub fn set_arrival(
        &mut self,
        has_arrived: bool,
        arrival_date: Option<NaiveDate>,
        today: NaiveDate,
    ) {
        self.has_arrived = has_arrived;
        self.arrival_date = match (has_arrived, arrival_date) {
            (_, Some(date)) => Some(date),
            (true, None) => self.arrival_date.or(Some(today)),
            (false, None) => None,
        };
    }
}

/// Input for creating a purchase order
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseOrderInput {
    pub material_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub quantity: Decimal,
    #[serde(default)]
    pub has_arrived: bool,
    pub arrival_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Input for updating a purchase order. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePurchaseOrderInput {
    pub material_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    pub has_arrived: Option<bool>,
    /// `Some(None)` (JSON `null`) clears the arrival date
    #[serde(default, deserialize_with = "present")]
    pub arrival_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NaiveDate>::deserialize(deserializer).map(Some)
}

/// Input for marking several orders arrived (or not) at once
#[derive(Debug, Clone, Deserialize)]
pub struct SetArrivalInput {
    pub order_ids: Vec<Uuid>,
    pub has_arrived: bool,
    pub arrival_date: Option<NaiveDate>,
}
