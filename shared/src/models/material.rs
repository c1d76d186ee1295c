//! Material catalog models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::InventorySnapshot;

/// A stock material (e.g. a roll of adhesive film)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Material {
    pub id: Uuid,
    /// Catalog code printed on the roll label (e.g., "BOPP-WHT-2.0")
    pub code: String,
    pub name: String,
    /// Derived stock position, rebuilt by the inventory engine
    #[serde(default)]
    pub inventory: InventorySnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            inventory: InventorySnapshot::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
