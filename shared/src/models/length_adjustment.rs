//! Length adjustment models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A signed manual correction to a material's available length
/// (physical recount, scrap, damage)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LengthAdjustment {
    pub id: Uuid,
    pub material_id: Option<Uuid>,
    /// Positive adds stock, negative removes it
    pub length: Option<Decimal>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LengthAdjustment {
    pub fn new(material_id: Uuid, length: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            material_id: Some(material_id),
            length: Some(length),
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Input for recording a length adjustment
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLengthAdjustmentInput {
    pub material_id: Uuid,
    pub length: Decimal,
    pub note: Option<String>,
}

/// Input for editing a length adjustment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLengthAdjustmentInput {
    pub material_id: Option<Uuid>,
    pub length: Option<Decimal>,
    pub note: Option<String>,
}
