//! Inventory reconciliation tests
//!
//! Tests for the recompute pipeline including:
//! - Snapshot formula and partition completeness
//! - Idempotent rebuilds
//! - Source load and write failure semantics
//! - Recompute timeouts and concurrent recomputes

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use labelworks_backend::error::{InventoryError, LoadStep};
use labelworks_backend::services::InventoryService;
use labelworks_backend::stores::{
    LengthAdjustmentStore, MemoryStore, PurchaseOrderStore, StoreOperation, Stores,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{InventorySnapshot, LengthAdjustment, Material, PurchaseOrder};
use shared::reconciliation::{aggregate_adjustments, build_snapshot, ArrivedFlag};
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn store_with_material(code: &str) -> (Arc<MemoryStore>, Uuid) {
    let store = Arc::new(MemoryStore::new());
    let material = Material::new(code, format!("{} roll", code));
    let id = material.id;
    store.insert_material(material).await;
    (store, id)
}

fn service(store: &Arc<MemoryStore>) -> InventoryService {
    InventoryService::new(&Stores::memory(store.clone()))
}

async fn inventory(store: &MemoryStore, material_id: Uuid) -> InventorySnapshot {
    store.material(material_id).await.unwrap().inventory
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    /// O1 (500, arrived), O2 (300, in transit), A1 (-20), A2 (+5)
    #[tokio::test]
    async fn test_reference_scenario() {
        let (store, material_id) = store_with_material("BOPP-WHT").await;
        let o1 = PurchaseOrder::new(material_id, dec("500")).arrived(true);
        let o2 = PurchaseOrder::new(material_id, dec("300"));
        let a1 = LengthAdjustment::new(material_id, dec("-20")).with_note("damaged core");
        let a2 = LengthAdjustment::new(material_id, dec("5")).with_note("recount");
        store.insert_order(&o1).await.unwrap();
        store.insert_order(&o2).await.unwrap();
        store.insert_adjustment(&a1).await.unwrap();
        store.insert_adjustment(&a2).await.unwrap();

        let summary = service(&store).recompute(None).await.unwrap();
        assert_eq!(summary.materials, 1);
        assert_eq!(summary.written, 1);

        let snapshot = inventory(&store, material_id).await;
        assert_eq!(snapshot.length_arrived, dec("500"));
        assert_eq!(snapshot.length_not_arrived, dec("300"));
        assert_eq!(snapshot.sum_of_length_adjustments, dec("-15"));
        assert_eq!(snapshot.net_length_available, dec("485"));
        assert_eq!(snapshot.material_orders, vec![o1.id, o2.id]);
        assert_eq!(snapshot.length_adjustments, vec![a1.id, a2.id]);
    }

    #[tokio::test]
    async fn test_material_without_sources_is_zero() {
        let (store, material_id) = store_with_material("PET-CLR").await;

        assert_ok!(service(&store).recompute(None).await);

        let snapshot = inventory(&store, material_id).await;
        assert_eq!(snapshot.net_length_available, Decimal::ZERO);
        assert!(snapshot.material_orders.is_empty());
        assert!(snapshot.length_adjustments.is_empty());
    }

    #[tokio::test]
    async fn test_empty_scope_writes_nothing() {
        let (store, _) = store_with_material("PAPER").await;

        let summary = service(&store).recompute(Some(&[] as &[Uuid])).await.unwrap();
        assert_eq!(summary.materials, 0);
        assert_eq!(summary.written, 0);
        assert_eq!(store.inventory_write_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_store_writes_nothing() {
        let store = Arc::new(MemoryStore::new());

        let summary = service(&store).recompute(None).await.unwrap();
        assert_eq!(summary.materials, 0);
        assert_eq!(store.inventory_write_count().await, 0);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let (store, material_id) = store_with_material("VINYL").await;
        store
            .insert_order(&PurchaseOrder::new(material_id, dec("120.25")).arrived(true))
            .await
            .unwrap();
        store
            .insert_adjustment(&LengthAdjustment::new(material_id, dec("-0.3333")))
            .await
            .unwrap();

        let service = service(&store);
        service.recompute(None).await.unwrap();
        let first = inventory(&store, material_id).await;
        service.recompute(None).await.unwrap();
        let second = inventory(&store, material_id).await;

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_adding_adjustment_raises_net_length() {
        let (store, material_id) = store_with_material("FOIL").await;
        store
            .insert_order(&PurchaseOrder::new(material_id, dec("1000")).arrived(true))
            .await
            .unwrap();
        let service = service(&store);
        service.recompute(None).await.unwrap();
        let before = inventory(&store, material_id).await.net_length_available;

        store
            .insert_adjustment(&LengthAdjustment::new(material_id, dec("100")))
            .await
            .unwrap();
        service.recompute(Some(&[material_id][..])).await.unwrap();

        let after = inventory(&store, material_id).await.net_length_available;
        assert_eq!(after, before + dec("100"));
    }

    #[tokio::test]
    async fn test_deleting_all_orders_keeps_adjustments() {
        let (store, material_id) = store_with_material("KRAFT").await;
        let o1 = PurchaseOrder::new(material_id, dec("400")).arrived(true);
        let o2 = PurchaseOrder::new(material_id, dec("50"));
        store.insert_order(&o1).await.unwrap();
        store.insert_order(&o2).await.unwrap();
        store
            .insert_adjustment(&LengthAdjustment::new(material_id, dec("-12.5")))
            .await
            .unwrap();
        let service = service(&store);
        service.recompute(None).await.unwrap();

        store.delete_order(o1.id).await.unwrap();
        store.delete_order(o2.id).await.unwrap();
        service.recompute(Some(&[material_id][..])).await.unwrap();

        let snapshot = inventory(&store, material_id).await;
        assert_eq!(snapshot.length_arrived, Decimal::ZERO);
        assert_eq!(snapshot.length_not_arrived, Decimal::ZERO);
        assert_eq!(snapshot.sum_of_length_adjustments, dec("-12.5"));
        assert_eq!(snapshot.net_length_available, dec("-12.5"));
        assert!(snapshot.material_orders.is_empty());
    }

    #[tokio::test]
    async fn test_scoped_recompute_matches_full_recompute() {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for code in ["A", "B", "C"] {
            let material = Material::new(code, code);
            ids.push(material.id);
            store.insert_material(material).await;
        }
        for (i, id) in ids.iter().enumerate() {
            store
                .insert_order(&PurchaseOrder::new(*id, Decimal::from(100 * (i + 1))).arrived(i % 2 == 0))
                .await
                .unwrap();
            store
                .insert_adjustment(&LengthAdjustment::new(*id, Decimal::from(i as i64 - 1)))
                .await
                .unwrap();
        }

        let service = service(&store);
        let summary = service.recompute(Some(&ids[1..2])).await.unwrap();
        assert_eq!(summary.materials, 1);
        let scoped = inventory(&store, ids[1]).await;
        // untouched material still has an empty snapshot
        assert_eq!(inventory(&store, ids[0]).await, InventorySnapshot::default());

        service.recompute(None).await.unwrap();
        assert_eq!(inventory(&store, ids[1]).await, scoped);
    }

    #[tokio::test]
    async fn test_single_bulk_write_per_recompute() {
        let store = Arc::new(MemoryStore::new());
        for code in ["A", "B", "C", "D"] {
            store.insert_material(Material::new(code, code)).await;
        }

        service(&store).recompute(None).await.unwrap();

        let writes = store.take_inventory_writes().await;
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].len(), 4);
    }

    #[tokio::test]
    async fn test_orders_without_material_are_skipped() {
        let (store, material_id) = store_with_material("LINER").await;
        let mut orphan = PurchaseOrder::new(material_id, dec("75")).arrived(true);
        orphan.material_id = None;
        let mut blank = PurchaseOrder::new(material_id, dec("1")).arrived(true);
        blank.quantity = None;
        store.insert_order(&orphan).await.unwrap();
        store.insert_order(&blank).await.unwrap();

        let summary = service(&store).recompute(None).await.unwrap();
        assert_eq!(summary.skipped_orders, vec![orphan.id]);

        let snapshot = inventory(&store, material_id).await;
        assert_eq!(snapshot.length_arrived, Decimal::ZERO);
        assert_eq!(snapshot.material_orders, vec![blank.id]);
    }

    #[tokio::test]
    async fn test_load_failure_aborts_before_write() {
        for (operation, step) in [
            (StoreOperation::ListMaterials, LoadStep::Materials),
            (StoreOperation::ListOrders, LoadStep::PurchaseOrders),
            (StoreOperation::ListAdjustments, LoadStep::LengthAdjustments),
        ] {
            let (store, _) = store_with_material("FAIL").await;
            store.set_failure(operation, true).await;

            let error = assert_err!(service(&store).recompute(None).await);
            match error {
                InventoryError::SourceLoad { step: failed, .. } => assert_eq!(failed, step),
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(store.inventory_write_count().await, 0);
        }
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let (store, material_id) = store_with_material("WRITE").await;
        store
            .insert_order(&PurchaseOrder::new(material_id, dec("10")).arrived(true))
            .await
            .unwrap();
        store.set_failure(StoreOperation::BulkUpdateInventory, true).await;

        let error = assert_err!(service(&store).recompute(None).await);
        assert!(matches!(error, InventoryError::PersistenceWrite(_)));
        assert_eq!(inventory(&store, material_id).await, InventorySnapshot::default());
    }

    #[tokio::test]
    async fn test_recompute_timeout() {
        let (store, _) = store_with_material("SLOW").await;
        store.set_load_delay(Some(Duration::from_millis(200))).await;

        let service = service(&store).with_timeout(Duration::from_millis(20));
        let error = assert_err!(service.recompute(None).await);
        assert!(matches!(error, InventoryError::Timeout(_)));
        assert_eq!(store.inventory_write_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_recomputes_satisfy_formula() {
        let (store, material_id) = store_with_material("RACE").await;
        store
            .insert_order(&PurchaseOrder::new(material_id, dec("900")).arrived(true))
            .await
            .unwrap();
        store
            .insert_adjustment(&LengthAdjustment::new(material_id, dec("-40")))
            .await
            .unwrap();

        let service = service(&store);
        let ids = [material_id];
        let (first, second) = tokio::join!(
            service.recompute(Some(&ids[..])),
            service.recompute(None)
        );
        assert_ok!(first);
        assert_ok!(second);

        let snapshot = inventory(&store, material_id).await;
        assert_eq!(
            snapshot.net_length_available,
            snapshot.length_arrived + snapshot.sum_of_length_adjustments
        );
        assert_eq!(snapshot.net_length_available, dec("860"));
    }

    #[tokio::test]
    async fn test_adjustments_round_to_four_places() {
        let (store, material_id) = store_with_material("ROUND").await;
        for _ in 0..3 {
            store
                .insert_adjustment(&LengthAdjustment::new(material_id, dec("0.33335")))
                .await
                .unwrap();
        }

        service(&store).recompute(None).await.unwrap();

        // 1.00005 rounds away from zero
        let snapshot = inventory(&store, material_id).await;
        assert_eq!(snapshot.sum_of_length_adjustments, dec("1.0001"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;

    /// Strategy for ordered quantities (0.0001 to 10000.0000)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000_000i64).prop_map(|n| Decimal::new(n, 4))
    }

    /// Strategy for signed adjustment lengths (-1000.0000 to 1000.0000)
    fn adjustment_strategy() -> impl Strategy<Value = Decimal> {
        (-10_000_000i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 4))
    }

    fn orders_strategy() -> impl Strategy<Value = Vec<(Decimal, bool)>> {
        prop::collection::vec((quantity_strategy(), any::<bool>()), 0..20)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Arrived plus not arrived equals the total ordered
        #[test]
        fn prop_partition_completeness(orders in orders_strategy()) {
            let material_id = Uuid::new_v4();
            let orders: Vec<PurchaseOrder> = orders
                .into_iter()
                .map(|(qty, arrived)| PurchaseOrder::new(material_id, qty).arrived(arrived))
                .collect();
            let total: Decimal = orders.iter().filter_map(|o| o.quantity).sum();

            let snapshot = build_snapshot(&orders, None, &ArrivedFlag);

            prop_assert_eq!(snapshot.length_arrived + snapshot.length_not_arrived, total);
            prop_assert_eq!(snapshot.material_orders.len(), orders.len());
        }

        /// Net available is arrived plus adjustments, exactly
        #[test]
        fn prop_net_length_formula(
            orders in orders_strategy(),
            adjustments in prop::collection::vec(adjustment_strategy(), 0..20)
        ) {
            let material_id = Uuid::new_v4();
            let orders: Vec<PurchaseOrder> = orders
                .into_iter()
                .map(|(qty, arrived)| PurchaseOrder::new(material_id, qty).arrived(arrived))
                .collect();
            let adjustments: Vec<LengthAdjustment> = adjustments
                .into_iter()
                .map(|length| LengthAdjustment::new(material_id, length))
                .collect();
            let expected_adjustments: Decimal = adjustments.iter().filter_map(|a| a.length).sum();

            let aggregation = aggregate_adjustments(&adjustments);
            let snapshot = build_snapshot(&orders, aggregation.get(&material_id), &ArrivedFlag);

            prop_assert_eq!(
                snapshot.net_length_available,
                snapshot.length_arrived + snapshot.sum_of_length_adjustments
            );
            prop_assert_eq!(snapshot.sum_of_length_adjustments, expected_adjustments);
            prop_assert_eq!(snapshot.length_adjustments.len(), adjustments.len());
        }

        /// Rebuilding from the same inputs gives the same snapshot
        #[test]
        fn prop_rebuild_is_deterministic(
            orders in orders_strategy(),
            adjustments in prop::collection::vec(adjustment_strategy(), 0..10)
        ) {
            let material_id = Uuid::new_v4();
            let orders: Vec<PurchaseOrder> = orders
                .into_iter()
                .map(|(qty, arrived)| PurchaseOrder::new(material_id, qty).arrived(arrived))
                .collect();
            let adjustments: Vec<LengthAdjustment> = adjustments
                .into_iter()
                .map(|length| LengthAdjustment::new(material_id, length))
                .collect();

            let first = build_snapshot(&orders, aggregate_adjustments(&adjustments).get(&material_id), &ArrivedFlag);
            let second = build_snapshot(&orders, aggregate_adjustments(&adjustments).get(&material_id), &ArrivedFlag);

            prop_assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }

        /// Adjustments of other materials never leak into a material's total
        #[test]
        fn prop_adjustments_grouped_by_material(
            mine in prop::collection::vec(adjustment_strategy(), 0..10),
            theirs in prop::collection::vec(adjustment_strategy(), 0..10)
        ) {
            let material_id = Uuid::new_v4();
            let other_id = Uuid::new_v4();
            let adjustments: Vec<LengthAdjustment> = mine
                .iter()
                .map(|length| LengthAdjustment::new(material_id, *length))
                .chain(theirs.iter().map(|length| LengthAdjustment::new(other_id, *length)))
                .collect();

            let aggregation = aggregate_adjustments(&adjustments);

            prop_assert_eq!(aggregation.sum_for(&material_id), mine.iter().sum::<Decimal>());
            prop_assert_eq!(aggregation.sum_for(&other_id), theirs.iter().sum::<Decimal>());
        }
    }
}
