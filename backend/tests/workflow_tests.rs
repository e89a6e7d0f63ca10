//! Workflow tests
//!
//! Receiving, production, shipment and manual adjustment against the
//! in-memory store:
//! - sign convention at the ledger boundary
//! - validation happens before any write
//! - a failing row mid-unit leaves nothing behind
//! - audit is queued after commit and never fails the workflow

mod common;

use std::sync::Arc;

use common::{admin, associate, at, dec, Fixture};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{AuditAction, AuditEntityKind, ItemKind, SourceKind, TxnKind};
use warehouse_inventory_backend::audit::{self, AuditSink};
use warehouse_inventory_backend::error::AppError;
use warehouse_inventory_backend::services::{
    AdjustInventoryInput, CreateProductionRunInput, CreateReceiptInput, CreateShipmentInput,
    ReceiptLineInput, ReceivingService, ShipmentLineInput, StockQuery,
};
use warehouse_inventory_backend::store::CatalogRepository;

fn receipt_line(material_id: i64, qty: &str, location_id: i64) -> ReceiptLineInput {
    ReceiptLineInput {
        material_id: Some(material_id),
        qty: Some(dec(qty)),
        location_id: Some(location_id),
    }
}

fn receipt(lines: Vec<ReceiptLineInput>) -> CreateReceiptInput {
    CreateReceiptInput {
        supplier_name: "Acme Supply".to_string(),
        received_at: Some(at(1, 9)),
        lines,
    }
}

fn shipment_line(product_id: i64, qty: &str, location_id: i64) -> ShipmentLineInput {
    ShipmentLineInput {
        product_id: Some(product_id),
        qty: Some(dec(qty)),
        location_id: Some(location_id),
    }
}

fn shipment(lines: Vec<ShipmentLineInput>) -> CreateShipmentInput {
    CreateShipmentInput {
        customer_name: "Corner Bakery".to_string(),
        shipped_at: Some(at(3, 15)),
        lines,
    }
}

fn production_run(product_id: i64, qty: &str, location_id: i64) -> CreateProductionRunInput {
    CreateProductionRunInput {
        product_id: Some(product_id),
        quantity_produced: Some(dec(qty)),
        location_id: Some(location_id),
        started_at: Some(at(2, 8)),
        completed_at: Some(at(2, 12)),
        notes: Some("Morning batch".to_string()),
    }
}

fn adjustment(kind: &str, item_id: i64, location_id: i64, qty: &str) -> AdjustInventoryInput {
    AdjustInventoryInput {
        item_kind: Some(kind.to_string()),
        item_id: Some(item_id),
        location_id: Some(location_id),
        qty: Some(dec(qty)),
        notes: None,
    }
}

// ============================================================================
// Receiving
// ============================================================================

#[tokio::test]
async fn receipt_writes_positive_material_in_rows() {
    let mut fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;

    let posted = fx
        .receiving()
        .create_receipt(5, receipt(vec![receipt_line(flour.id, "15", a1.id)]))
        .await
        .unwrap();

    assert_eq!(posted.record.lines.len(), 1);
    assert_eq!(posted.record.lines[0].material.as_ref().unwrap().sku, "RM-FLOUR");
    assert_eq!(posted.record.lines[0].location.as_ref().unwrap().code, "A1");

    let entry = &posted.ledger_entries[0];
    assert_eq!(entry.txn_kind, TxnKind::MaterialIn);
    assert_eq!(entry.source_kind, SourceKind::Receipt);
    assert_eq!(entry.source_id, Some(posted.record.id));
    assert_eq!(entry.item_kind, ItemKind::Material);
    assert_eq!(entry.quantity, dec("15"));
    assert_eq!(entry.user_id, 5);
    assert_eq!(entry.occurred_at, at(1, 9));

    let records = fx.drain_audit();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entity_kind, AuditEntityKind::Receipt);
    assert_eq!(records[0].entity_id, Some(posted.record.id));
    assert_eq!(
        records[0].description,
        "Created receipt from Acme Supply with 1 line(s)"
    );
}

#[tokio::test]
async fn receipt_with_bad_third_line_writes_nothing() {
    let mut fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;

    let err = fx
        .receiving()
        .create_receipt(
            1,
            receipt(vec![
                receipt_line(flour.id, "1", a1.id),
                receipt_line(flour.id, "2", a1.id),
                receipt_line(flour.id, "3", 999),
                receipt_line(flour.id, "4", a1.id),
            ]),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::NotFound {
            resource: "Location",
            id: 999
        }
    ));
    assert!(fx.store.ledger_entries().await.is_empty());
    assert_eq!(fx.store.header_counts().await, (0, 0, 0));
    assert!(fx.drain_audit().is_empty());
}

#[tokio::test]
async fn receipt_requires_supplier_date_and_lines() {
    let fx = Fixture::new();

    let mut input = receipt(vec![]);
    input.supplier_name = String::new();
    let err = fx.receiving().create_receipt(1, input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "supplierName"));

    let mut input = receipt(vec![]);
    input.received_at = None;
    let err = fx.receiving().create_receipt(1, input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "receivedAt"));

    let err = fx
        .receiving()
        .create_receipt(1, receipt(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "lines"));
}

#[tokio::test]
async fn receipt_line_quantity_must_be_present_and_non_zero() {
    let fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;

    let err = fx
        .receiving()
        .create_receipt(
            1,
            receipt(vec![
                receipt_line(flour.id, "1", a1.id),
                receipt_line(flour.id, "0", a1.id),
            ]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "lines[1].qty"));

    let mut missing = receipt_line(flour.id, "1", a1.id);
    missing.qty = None;
    let err = fx
        .receiving()
        .create_receipt(1, receipt(vec![missing]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "lines[0].qty"));
    assert!(fx.store.ledger_entries().await.is_empty());
}

#[tokio::test]
async fn receipt_quantities_are_stored_at_three_decimals() {
    let fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;

    let posted = fx
        .receiving()
        .create_receipt(1, receipt(vec![receipt_line(flour.id, "1.23456", a1.id)]))
        .await
        .unwrap();

    assert_eq!(posted.record.lines[0].qty, dec("1.235"));
    assert_eq!(posted.ledger_entries[0].quantity, dec("1.235"));
}

#[test]
fn receipt_line_reads_json_numbers_exactly() {
    let line: ReceiptLineInput = serde_json::from_str(
        r#"{"materialId":1,"qty":123456789012345.678,"locationId":1}"#,
    )
    .unwrap();

    assert_eq!(line.qty, Some(dec("123456789012345.678")));
    assert_eq!(line.qty.unwrap().to_string(), "123456789012345.678");
}

#[tokio::test]
async fn deleting_a_receipt_keeps_its_ledger_rows() {
    let mut fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;
    let posted = fx
        .receiving()
        .create_receipt(1, receipt(vec![receipt_line(flour.id, "9", a1.id)]))
        .await
        .unwrap();
    fx.drain_audit();

    fx.receiving()
        .delete_receipt(2, posted.record.id)
        .await
        .unwrap();

    assert_eq!(fx.store.header_counts().await, (0, 0, 0));
    assert_eq!(fx.store.ledger_entries().await.len(), 1);
    let stock = fx.ledger().current_stock(StockQuery::default()).await.unwrap();
    assert_eq!(stock[0].current_stock, dec("9"));

    let records = fx.drain_audit();
    assert_eq!(records[0].action, AuditAction::Delete);
    assert!(records[0].description.contains("inventory transactions preserved"));

    let err = fx
        .receiving()
        .get_receipt(posted.record.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { resource: "Receipt", .. }));
}

// ============================================================================
// Production
// ============================================================================

#[tokio::test]
async fn production_consumes_bom_and_outputs_product() {
    let mut fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let yeast = fx.material("RM-YEAST", "0").await;
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;
    fx.store.add_bom_line(bread.id, flour.id, dec("0.5")).await.unwrap();
    fx.store.add_bom_line(bread.id, yeast.id, dec("0.01")).await.unwrap();

    let posted = fx
        .production()
        .create_production_run(4, production_run(bread.id, "20", a1.id))
        .await
        .unwrap();

    assert_eq!(posted.record.product.as_ref().unwrap().id, bread.id);
    assert_eq!(posted.record.notes.as_deref(), Some("Morning batch"));

    let entries = &posted.ledger_entries;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].txn_kind, TxnKind::MaterialConsume);
    assert_eq!(entries[0].item_id, flour.id);
    assert_eq!(entries[0].quantity, dec("-10"));
    assert_eq!(entries[1].item_id, yeast.id);
    assert_eq!(entries[1].quantity, dec("-0.2"));
    assert_eq!(entries[2].txn_kind, TxnKind::ProductIn);
    assert_eq!(entries[2].item_kind, ItemKind::Product);
    assert_eq!(entries[2].quantity, dec("20"));
    assert!(entries.iter().all(|e| e.occurred_at == at(2, 12)));
    assert!(entries
        .iter()
        .all(|e| e.source_kind == SourceKind::Production && e.source_id == Some(posted.record.id)));

    let records = fx.drain_audit();
    assert_eq!(
        records[0].description,
        "Created production run for Product FG-BREAD (qty: 20)"
    );
}

#[tokio::test]
async fn production_may_drive_material_negative() {
    let fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;
    fx.store.add_bom_line(bread.id, flour.id, dec("2")).await.unwrap();

    fx.production()
        .create_production_run(1, production_run(bread.id, "3", a1.id))
        .await
        .unwrap();

    let stock = fx
        .ledger()
        .stock_for_item(ItemKind::Material, flour.id)
        .await
        .unwrap();
    assert_eq!(stock.total_stock, dec("-6"));
}

#[tokio::test]
async fn production_rejects_unknown_product_and_location() {
    let fx = Fixture::new();
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;

    let err = fx
        .production()
        .create_production_run(1, production_run(42, "1", a1.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { resource: "Product", id: 42 }));

    let err = fx
        .production()
        .create_production_run(1, production_run(bread.id, "1", 77))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { resource: "Location", id: 77 }));

    let mut input = production_run(bread.id, "1", a1.id);
    input.quantity_produced = Some(Decimal::ZERO);
    let err = fx
        .production()
        .create_production_run(1, input)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "quantityProduced"));

    assert!(fx.store.ledger_entries().await.is_empty());
}

#[tokio::test]
async fn production_row_overflow_rolls_back_the_whole_run() {
    let mut fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;
    fx.store
        .add_bom_line(bread.id, flour.id, dec("1000000"))
        .await
        .unwrap();

    // consumption of 10^6 * 10^10 does not fit NUMERIC(18,3)
    let err = fx
        .production()
        .create_production_run(1, production_run(bread.id, "10000000000", a1.id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert!(fx.store.ledger_entries().await.is_empty());
    assert_eq!(fx.store.header_counts().await, (0, 0, 0));
    assert!(fx.drain_audit().is_empty());
}

#[tokio::test]
async fn oversized_production_quantity_is_rejected_before_consumption() {
    let mut fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;
    fx.store
        .add_bom_line(bread.id, flour.id, dec("10000"))
        .await
        .unwrap();

    let err = fx
        .production()
        .create_production_run(
            1,
            production_run(bread.id, "10000000000000000000000000", a1.id),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "quantityProduced"));
    assert!(fx.store.ledger_entries().await.is_empty());
    assert_eq!(fx.store.header_counts().await, (0, 0, 0));
    assert!(fx.drain_audit().is_empty());
}

#[tokio::test]
async fn consumption_beyond_decimal_range_is_rejected() {
    let fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;
    fx.store
        .add_bom_line(bread.id, flour.id, dec("100000000000000000000"))
        .await
        .unwrap();

    let err = fx
        .production()
        .create_production_run(1, production_run(bread.id, "999999999999999", a1.id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "quantityProduced"));
    assert!(fx.store.ledger_entries().await.is_empty());
}

#[tokio::test]
async fn deleting_a_production_run_keeps_its_ledger_rows() {
    let fx = Fixture::new();
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;
    let posted = fx
        .production()
        .create_production_run(1, production_run(bread.id, "2", a1.id))
        .await
        .unwrap();

    fx.production()
        .delete_production_run(1, posted.record.id)
        .await
        .unwrap();

    assert!(fx.production().list_production_runs().await.unwrap().is_empty());
    assert_eq!(fx.store.ledger_entries().await.len(), 1);

    let err = fx
        .production()
        .delete_production_run(1, posted.record.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

// ============================================================================
// Shipment
// ============================================================================

#[tokio::test]
async fn shipment_line_keeps_quantity_and_ledger_negates_it() {
    let fx = Fixture::new();
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;

    let posted = fx
        .shipments()
        .create_shipment(3, shipment(vec![shipment_line(bread.id, "6", a1.id)]))
        .await
        .unwrap();

    assert_eq!(posted.record.lines[0].qty, dec("6"));
    assert_eq!(posted.record.lines[0].product.as_ref().unwrap().sku, "FG-BREAD");
    let entry = &posted.ledger_entries[0];
    assert_eq!(entry.txn_kind, TxnKind::ProductOut);
    assert_eq!(entry.source_kind, SourceKind::Shipment);
    assert_eq!(entry.quantity, dec("-6"));
    assert_eq!(entry.occurred_at, at(3, 15));
}

#[tokio::test]
async fn shipment_with_bad_third_line_writes_nothing() {
    let fx = Fixture::new();
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;

    let err = fx
        .shipments()
        .create_shipment(
            1,
            shipment(vec![
                shipment_line(bread.id, "1", a1.id),
                shipment_line(bread.id, "1", a1.id),
                shipment_line(bread.id, "1", 555),
                shipment_line(bread.id, "1", a1.id),
            ]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound { resource: "Location", id: 555 }));
    assert!(fx.store.ledger_entries().await.is_empty());
    assert_eq!(fx.store.header_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn shipment_rejects_material_ids_as_products() {
    let fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;

    let err = fx
        .shipments()
        .create_shipment(1, shipment(vec![shipment_line(flour.id, "1", a1.id)]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound { resource: "Product", .. }));
}

#[tokio::test]
async fn get_shipment_joins_lines() {
    let fx = Fixture::new();
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;
    let posted = fx
        .shipments()
        .create_shipment(1, shipment(vec![shipment_line(bread.id, "2", a1.id)]))
        .await
        .unwrap();

    let found = fx.shipments().get_shipment(posted.record.id).await.unwrap();

    assert_eq!(found.customer_name, "Corner Bakery");
    assert_eq!(found.lines[0].location.as_ref().unwrap().code, "A1");
    assert_eq!(fx.shipments().list_shipments().await.unwrap().len(), 1);
}

// ============================================================================
// Manual adjustment
// ============================================================================

#[tokio::test]
async fn associate_cannot_adjust() {
    let fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;

    let err = fx
        .adjustments()
        .adjust(&associate(), adjustment("MATERIAL", flour.id, a1.id, "5"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientPermissions));
    assert!(fx.store.ledger_entries().await.is_empty());
}

#[tokio::test]
async fn admin_adjustment_writes_one_manual_row() {
    let mut fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;

    let entry = fx
        .adjustments()
        .adjust(&admin(), adjustment("MATERIAL", flour.id, a1.id, "5"))
        .await
        .unwrap();

    assert_eq!(entry.txn_kind, TxnKind::Adjust);
    assert_eq!(entry.source_kind, SourceKind::Manual);
    assert_eq!(entry.source_id, None);
    assert_eq!(entry.quantity, dec("5"));
    assert_eq!(entry.notes.as_deref(), Some("Manual inventory adjustment"));

    let records = fx.drain_audit();
    assert_eq!(records[0].entity_kind, AuditEntityKind::InventoryAdjustment);
    assert_eq!(records[0].entity_id, Some(entry.id));
    assert_eq!(
        records[0].description,
        format!("Manual inventory adjustment: MATERIAL #{} qty +5", flour.id)
    );
}

#[tokio::test]
async fn negative_adjustment_is_described_with_its_sign() {
    let mut fx = Fixture::new();
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;

    fx.adjustments()
        .adjust(&admin(), adjustment("PRODUCT", bread.id, a1.id, "-2.5"))
        .await
        .unwrap();

    let records = fx.drain_audit();
    assert_eq!(
        records[0].description,
        format!("Manual inventory adjustment: PRODUCT #{} qty -2.5", bread.id)
    );
}

#[tokio::test]
async fn adjustment_description_ignores_trailing_zeros() {
    let mut fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;

    let entry = fx
        .adjustments()
        .adjust(&admin(), adjustment("MATERIAL", flour.id, a1.id, "5.000"))
        .await
        .unwrap();

    assert_eq!(entry.quantity, dec("5"));
    let records = fx.drain_audit();
    assert_eq!(
        records[0].description,
        format!("Manual inventory adjustment: MATERIAL #{} qty +5", flour.id)
    );
}

#[tokio::test]
async fn production_description_ignores_trailing_zeros() {
    let mut fx = Fixture::new();
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;

    fx.production()
        .create_production_run(1, production_run(bread.id, "20.000", a1.id))
        .await
        .unwrap();

    let records = fx.drain_audit();
    assert_eq!(
        records[0].description,
        "Created production run for Product FG-BREAD (qty: 20)"
    );
}

#[tokio::test]
async fn adjustment_quantity_must_fit_storage() {
    let fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;

    let err = fx
        .adjustments()
        .adjust(
            &admin(),
            adjustment("MATERIAL", flour.id, a1.id, "-1000000000000000"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "qty"));
    assert!(fx.store.ledger_entries().await.is_empty());
}

#[tokio::test]
async fn adjustment_validates_kind_and_references() {
    let fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;

    let err = fx
        .adjustments()
        .adjust(&admin(), adjustment("WIDGET", flour.id, a1.id, "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "itemKind"));

    let err = fx
        .adjustments()
        .adjust(&admin(), adjustment("PRODUCT", flour.id, a1.id, "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { resource: "Product", .. }));

    let mut input = adjustment("MATERIAL", flour.id, a1.id, "1");
    input.qty = None;
    let err = fx.adjustments().adjust(&admin(), input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "qty"));

    assert!(fx.store.ledger_entries().await.is_empty());
}

// ============================================================================
// Audit side-channel
// ============================================================================

#[tokio::test]
async fn audit_failure_does_not_fail_the_workflow() {
    let fx = Fixture::new();
    let flour = fx.material("RM-FLOUR", "0").await;
    let a1 = fx.location("A1").await;
    fx.store.fail_audit_writes(true);

    let (sink, receiver) = AuditSink::channel(8);
    let writer = audit::spawn_writer(receiver, fx.store.clone());
    let catalog: Arc<dyn CatalogRepository> = fx.store.clone();
    let service = ReceivingService::new(catalog, fx.store.clone(), sink);

    let posted = service
        .create_receipt(1, receipt(vec![receipt_line(flour.id, "3", a1.id)]))
        .await;
    drop(service);
    writer.await.unwrap();

    assert!(posted.is_ok());
    assert_eq!(fx.store.ledger_entries().await.len(), 1);
    assert!(fx.store.audit_records().await.is_empty());
}

#[tokio::test]
async fn closed_audit_channel_does_not_fail_the_workflow() {
    let fx = Fixture::new();
    let bread = fx.product("FG-BREAD").await;
    let a1 = fx.location("A1").await;

    let (sink, receiver) = AuditSink::channel(8);
    drop(receiver);
    let catalog: Arc<dyn CatalogRepository> = fx.store.clone();
    let service = warehouse_inventory_backend::services::ShipmentService::new(
        catalog,
        fx.store.clone(),
        sink,
    );

    let posted = service
        .create_shipment(1, shipment(vec![shipment_line(bread.id, "1", a1.id)]))
        .await;

    assert!(posted.is_ok());
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every production run leaves material and product stock exactly where
    /// the BOM predicts.
    #[test]
    fn production_stock_matches_bom_prediction(
        per_unit in prop::collection::vec(1i64..5_000, 1..5),
        produced in 1i64..500,
    ) {
        tokio_test::block_on(async {
            let fx = Fixture::new();
            let product = fx.product("FG-P").await;
            let loc = fx.location("L").await;
            let mut bom = Vec::new();
            for (i, q) in per_unit.iter().enumerate() {
                let m = fx.material(&format!("RM-{}", i), "0").await;
                let qpu = Decimal::new(*q, 3);
                fx.store.add_bom_line(product.id, m.id, qpu).await.unwrap();
                bom.push((m.id, qpu));
            }

            let quantity = Decimal::from(produced);
            fx.production()
                .create_production_run(1, production_run(product.id, &quantity.to_string(), loc.id))
                .await
                .unwrap();

            for (material_id, qpu) in bom {
                let stock = fx
                    .ledger()
                    .stock_for_item(ItemKind::Material, material_id)
                    .await
                    .unwrap();
                assert_eq!(stock.total_stock, -(qpu * quantity));
            }
            let output = fx
                .ledger()
                .stock_for_item(ItemKind::Product, product.id)
                .await
                .unwrap();
            assert_eq!(output.total_stock, quantity);
        });
    }
}
