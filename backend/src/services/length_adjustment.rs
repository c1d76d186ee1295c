//! Length adjustment service

use std::sync::Arc;

use chrono::Utc;
use shared::models::{
    CreateLengthAdjustmentInput, LengthAdjustment, UpdateLengthAdjustmentInput,
};
use shared::types::MaterialScope;
use shared::validation::{validate_adjustment_length, validate_note};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::triggers::{ChangeEvent, ChangeNotifier, ChangeOperation, ChangeSource};
use crate::stores::{LengthAdjustmentStore, MaterialStore, Stores};

/// Length adjustment service
#[derive(Clone)]
pub struct LengthAdjustmentService {
    materials: Arc<dyn MaterialStore>,
    adjustments: Arc<dyn LengthAdjustmentStore>,
    notifier: Arc<ChangeNotifier>,
}

impl LengthAdjustmentService {
    pub fn new(stores: &Stores, notifier: Arc<ChangeNotifier>) -> Self {
        Self {
            materials: stores.materials.clone(),
            adjustments: stores.adjustments.clone(),
            notifier,
        }
    }

    /// Record a length adjustment
    pub async fn create(&self, input: CreateLengthAdjustmentInput) -> AppResult<LengthAdjustment> {
        validate_adjustment_length(input.length)
            .map_err(|msg| AppError::validation("length", msg))?;
        if let Some(note) = &input.note {
            validate_note(note).map_err(|msg| AppError::validation("note", msg))?;
        }
        self.ensure_material(input.material_id).await?;

        let now = Utc::now();
        let adjustment = LengthAdjustment {
            id: Uuid::new_v4(),
            material_id: Some(input.material_id),
            length: Some(input.length),
            note: input.note,
            created_at: now,
            updated_at: now,
        };
        self.adjustments.insert_adjustment(&adjustment).await?;

        self.publish(
            ChangeOperation::Created,
            MaterialScope::materials(adjustment.material_id),
        )
        .await;

        Ok(adjustment)
    }

    /// Edit a length adjustment
    pub async fn update(
        &self,
        adjustment_id: Uuid,
        input: UpdateLengthAdjustmentInput,
    ) -> AppResult<LengthAdjustment> {
        let existing = self
            .adjustments
            .get_adjustment(adjustment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Length adjustment".to_string()))?;

        if let Some(length) = input.length {
            validate_adjustment_length(length)
                .map_err(|msg| AppError::validation("length", msg))?;
        }
        if let Some(note) = &input.note {
            validate_note(note).map_err(|msg| AppError::validation("note", msg))?;
        }
        if let Some(material_id) = input.material_id {
            self.ensure_material(material_id).await?;
        }

        let adjustment = LengthAdjustment {
            material_id: input.material_id.or(existing.material_id),
            length: input.length.or(existing.length),
            note: input.note.or_else(|| existing.note.clone()),
            updated_at: Utc::now(),
            ..existing.clone()
        };

        if !self.adjustments.update_adjustment(&adjustment).await? {
            return Err(AppError::NotFound("Length adjustment".to_string()));
        }

        self.publish(
            ChangeOperation::Updated,
            MaterialScope::materials(
                existing
                    .material_id
                    .into_iter()
                    .chain(adjustment.material_id),
            ),
        )
        .await;

        Ok(adjustment)
    }

    /// Delete a length adjustment
    pub async fn delete(&self, adjustment_id: Uuid) -> AppResult<()> {
        let deleted = self
            .adjustments
            .delete_adjustment(adjustment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Length adjustment".to_string()))?;

        self.publish(
            ChangeOperation::Deleted,
            MaterialScope::materials(deleted.material_id),
        )
        .await;

        Ok(())
    }

    /// Delete every adjustment of a material
    pub async fn delete_for_material(&self, material_id: Uuid) -> AppResult<u64> {
        let deleted = self
            .adjustments
            .delete_adjustments_for_material(material_id)
            .await?;

        if deleted > 0 {
            self.publish(
                ChangeOperation::BulkDeleted,
                MaterialScope::materials([material_id]),
            )
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
            .notify(ChangeEvent::new(ChangeSource::LengthAdjustment, operation, scope))
            .await;
    }
}
