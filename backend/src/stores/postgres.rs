//! PostgreSQL store
//!
//! Materials keep their inventory snapshot in a JSONB column. The bulk
//! inventory write is a single UPDATE statement, so it either applies to
//! every listed material or to none.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::models::{InventorySnapshot, InventoryUpdate, LengthAdjustment, Material, PurchaseOrder};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{LengthAdjustmentStore, MaterialStore, PurchaseOrderStore, StoreResult};

/// Postgres-backed implementation of every store trait
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, FromRow)]
struct MaterialRow {
    id: Uuid,
    code: String,
    name: String,
    inventory: Json<InventorySnapshot>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MaterialRow> for Material {
    fn from(row: MaterialRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            inventory: row.inventory.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PurchaseOrderRow {
    id: Uuid,
    material_id: Option<Uuid>,
    vendor_id: Option<Uuid>,
    quantity: Option<Decimal>,
    has_arrived: bool,
    arrival_date: Option<NaiveDate>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PurchaseOrderRow> for PurchaseOrder {
    fn from(row: PurchaseOrderRow) -> Self {
        Self {
            id: row.id,
            material_id: row.material_id,
            vendor_id: row.vendor_id,
            quantity: row.quantity,
            has_arrived: row.has_arrived,
            arrival_date: row.arrival_date,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LengthAdjustmentRow {
    id: Uuid,
    material_id: Option<Uuid>,
    length: Option<Decimal>,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LengthAdjustmentRow> for LengthAdjustment {
    fn from(row: LengthAdjustmentRow) -> Self {
        Self {
            id: row.id,
            material_id: row.material_id,
            length: row.length,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn to_filter(material_ids: Option<&[Uuid]>) -> Option<Vec<Uuid>> {
    material_ids.map(<[Uuid]>::to_vec)
}

// ============================================================================
// Materials
// ============================================================================

#[async_trait]
impl MaterialStore for PgStore {
    async fn list_materials(&self, material_ids: Option<&[Uuid]>) -> StoreResult<Vec<Material>> {
        let rows = sqlx::query_as::<_, MaterialRow>(
            r#"
            SELECT id, code, name, inventory, created_at, updated_at
            FROM materials
            WHERE ($1::uuid[] IS NULL OR id = ANY($1))
            ORDER BY created_at, id
            "#,
        )
        .bind(to_filter(material_ids))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Material::from).collect())
    }

    async fn get_material(&self, id: Uuid) -> StoreResult<Option<Material>> {
        let row = sqlx::query_as::<_, MaterialRow>(
            "SELECT id, code, name, inventory, created_at, updated_at FROM materials WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Material::from))
    }

    async fn bulk_update_inventory(&self, updates: &[InventoryUpdate]) -> StoreResult<u64> {
        if updates.is_empty() {
            return Ok(0);
        }

        // Only the inventory column is set; updated_at tracks catalog edits
        let result = sqlx::query(
            r#"
            UPDATE materials AS m
            SET inventory = u.inventory
            FROM jsonb_to_recordset($1) AS u(material_id UUID, inventory JSONB)
            WHERE m.id = u.material_id
            "#,
        )
        .bind(Json(updates))
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }
}

// ============================================================================
// Purchase orders
// ============================================================================

#[async_trait]
impl PurchaseOrderStore for PgStore {
    async fn list_orders_for_materials(
        &self,
        material_ids: Option<&[Uuid]>,
    ) -> StoreResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, PurchaseOrderRow>(
            r#"
            SELECT id, material_id, vendor_id, quantity, has_arrived, arrival_date, notes,
                   created_at, updated_at
            FROM purchase_orders
            WHERE ($1::uuid[] IS NULL OR material_id = ANY($1))
            ORDER BY created_at, id
            "#,
        )
        .bind(to_filter(material_ids))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PurchaseOrder::from).collect())
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>> {
        let row = sqlx::query_as::<_, PurchaseOrderRow>(
            r#"
            SELECT id, material_id, vendor_id, quantity, has_arrived, arrival_date, notes,
                   created_at, updated_at
            FROM purchase_orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(PurchaseOrder::from))
    }

    async fn insert_order(&self, order: &PurchaseOrder) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO purchase_orders (
                id, material_id, vendor_id, quantity, has_arrived, arrival_date, notes,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id)
        .bind(order.material_id)
        .bind(order.vendor_id)
        .bind(order.quantity)
        .bind(order.has_arrived)
        .bind(order.arrival_date)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn update_order(&self, order: &PurchaseOrder) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE purchase_orders
            SET material_id = $2, vendor_id = $3, quantity = $4, has_arrived = $5,
                arrival_date = $6, notes = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(order.id)
        .bind(order.material_id)
        .bind(order.vendor_id)
        .bind(order.quantity)
        .bind(order.has_arrived)
        .bind(order.arrival_date)
        .bind(&order.notes)
        .bind(order.updated_at)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_arrival(
        &self,
        order_ids: &[Uuid],
        has_arrived: bool,
        arrival_date: Option<NaiveDate>,
    ) -> StoreResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, PurchaseOrderRow>(
            r#"
            UPDATE purchase_orders
            SET has_arrived = $2,
                arrival_date = CASE
                    WHEN $3::date IS NOT NULL THEN $3
                    WHEN $2 THEN COALESCE(arrival_date, (NOW() AT TIME ZONE 'UTC')::date)
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = ANY($1)
            RETURNING id, material_id, vendor_id, quantity, has_arrived, arrival_date, notes,
                      created_at, updated_at
            "#,
        )
        .bind(order_ids.to_vec())
        .bind(has_arrived)
        .bind(arrival_date)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PurchaseOrder::from).collect())
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>> {
        let row = sqlx::query_as::<_, PurchaseOrderRow>(
            r#"
            DELETE FROM purchase_orders
            WHERE id = $1
            RETURNING id, material_id, vendor_id, quantity, has_arrived, arrival_date, notes,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(PurchaseOrder::from))
    }

    async fn delete_orders_by_vendor(&self, vendor_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM purchase_orders WHERE vendor_id = $1")
            .bind(vendor_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

// ============================================================================
// Length adjustments
// ============================================================================

#[async_trait]
impl LengthAdjustmentStore for PgStore {
    async fn list_adjustments(
        &self,
        material_ids: Option<&[Uuid]>,
    ) -> StoreResult<Vec<LengthAdjustment>> {
        let rows = sqlx::query_as::<_, LengthAdjustmentRow>(
            r#"
            SELECT id, material_id, length, note, created_at, updated_at
            FROM length_adjustments
            WHERE ($1::uuid[] IS NULL OR material_id = ANY($1))
            ORDER BY created_at, id
            "#,
        )
        .bind(to_filter(material_ids))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(LengthAdjustment::from).collect())
    }

    async fn get_adjustment(&self, id: Uuid) -> StoreResult<Option<LengthAdjustment>> {
        let row = sqlx::query_as::<_, LengthAdjustmentRow>(
            "SELECT id, material_id, length, note, created_at, updated_at FROM length_adjustments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(LengthAdjustment::from))
    }

    async fn insert_adjustment(&self, adjustment: &LengthAdjustment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO length_adjustments (id, material_id, length, note, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(adjustment.id)
        .bind(adjustment.material_id)
        .bind(adjustment.length)
        .bind(&adjustment.note)
        .bind(adjustment.created_at)
        .bind(adjustment.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn update_adjustment(&self, adjustment: &LengthAdjustment) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE length_adjustments
            SET material_id = $2, length = $3, note = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(adjustment.id)
        .bind(adjustment.material_id)
        .bind(adjustment.length)
        .bind(&adjustment.note)
        .bind(adjustment.updated_at)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_adjustment(&self, id: Uuid) -> StoreResult<Option<LengthAdjustment>> {
        let row = sqlx::query_as::<_, LengthAdjustmentRow>(
            r#"
            DELETE FROM length_adjustments
            WHERE id = $1
            RETURNING id, material_id, length, note, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(LengthAdjustment::from))
    }

    async fn delete_adjustments_for_material(&self, material_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM length_adjustments WHERE material_id = $1")
            .bind(material_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
