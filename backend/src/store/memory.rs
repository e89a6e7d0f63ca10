//! In-process storage backend
//!
//! All tables live behind one `RwLock`. A write takes the lock for the whole
//! unit of work, stages every row against a copy of the id sequences, and
//! publishes only after each row has passed the same column checks the SQL
//! schema applies. A rejected row therefore leaves no trace.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::ledger::aggregate_balances;
use shared::{
    check_storable, AuditRecord, BomLine, EntryFilter, LedgerEntry, Location, Material,
    NewLedgerEntry, NewProductionRun, NewReceipt, NewReceiptLine, NewShipment, NewShipmentLine,
    Product, ProductionRun, Receipt, ReceiptLine, Shipment, ShipmentLine, StockBalance,
    StockFilter,
};
use tokio::sync::RwLock;

use super::{AuditRepository, CatalogRepository, LedgerRepository};
use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Clone, Copy)]
struct Sequences {
    material: i64,
    product: i64,
    location: i64,
    bom_line: i64,
    receipt: i64,
    receipt_line: i64,
    production_run: i64,
    shipment: i64,
    shipment_line: i64,
    ledger_entry: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    seq: Sequences,
    materials: BTreeMap<i64, Material>,
    products: BTreeMap<i64, Product>,
    locations: BTreeMap<i64, Location>,
    bom: Vec<BomLine>,
    receipts: BTreeMap<i64, Receipt>,
    production_runs: BTreeMap<i64, ProductionRun>,
    shipments: BTreeMap<i64, Shipment>,
    entries: Vec<LedgerEntry>,
    audit: Vec<AuditRecord>,
}

/// Storage backend holding every table in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_audit: AtomicBool,
}

fn storable(field: &str, quantity: Decimal) -> AppResult<()> {
    check_storable(quantity)
        .map_err(|_| AppError::Storage(format!("numeric field overflow in {}", field)))
}

/// Build ledger rows for one unit of work without touching the tables
fn stage_entries(
    seq: &mut Sequences,
    source_id: Option<i64>,
    entries: Vec<NewLedgerEntry>,
) -> AppResult<Vec<LedgerEntry>> {
    let created_at = Utc::now();
    entries
        .into_iter()
        .map(|entry| {
            storable("inventory_txns.quantity", entry.quantity)?;
            Ok(LedgerEntry {
                id: next(&mut seq.ledger_entry),
                txn_kind: entry.txn_kind,
                source_kind: entry.source_kind,
                source_id,
                item_kind: entry.item_kind,
                item_id: entry.item_id,
                quantity: entry.quantity,
                location_id: entry.location_id,
                user_id: entry.user_id,
                occurred_at: entry.occurred_at,
                notes: entry.notes,
                created_at,
            })
        })
        .collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material; SKUs are unique
    pub async fn add_material(
        &self,
        sku: &str,
        name: &str,
        uom: &str,
        min_stock: Decimal,
    ) -> AppResult<Material> {
        let mut tables = self.tables.write().await;
        if tables.materials.values().any(|m| m.sku == sku) {
            return Err(AppError::Conflict {
                resource: "material".to_string(),
                message: format!("Material SKU {} already exists", sku),
            });
        }
        let material = Material {
            id: next(&mut tables.seq.material),
            sku: sku.to_string(),
            name: name.to_string(),
            uom: uom.to_string(),
            min_stock,
            active: true,
        };
        tables.materials.insert(material.id, material.clone());
        Ok(material)
    }

    /// Add a product; SKUs are unique
    pub async fn add_product(&self, sku: &str, name: &str, uom: &str) -> AppResult<Product> {
        let mut tables = self.tables.write().await;
        if tables.products.values().any(|p| p.sku == sku) {
            return Err(AppError::Conflict {
                resource: "product".to_string(),
                message: format!("Product SKU {} already exists", sku),
            });
        }
        let product = Product {
            id: next(&mut tables.seq.product),
            sku: sku.to_string(),
            name: name.to_string(),
            uom: uom.to_string(),
            active: true,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    /// Add a location; codes are unique
    pub async fn add_location(&self, code: &str, description: Option<&str>) -> AppResult<Location> {
        let mut tables = self.tables.write().await;
        if tables.locations.values().any(|l| l.code == code) {
            return Err(AppError::Conflict {
                resource: "location".to_string(),
                message: format!("Location code {} already exists", code),
            });
        }
        let location = Location {
            id: next(&mut tables.seq.location),
            code: code.to_string(),
            description: description.map(str::to_string),
        };
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    pub async fn add_bom_line(
        &self,
        product_id: i64,
        material_id: i64,
        qty_per_unit: Decimal,
    ) -> AppResult<BomLine> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&product_id) {
            return Err(AppError::not_found("Product", product_id));
        }
        if !tables.materials.contains_key(&material_id) {
            return Err(AppError::not_found("Material", material_id));
        }
        let line = BomLine {
            id: next(&mut tables.seq.bom_line),
            product_id,
            material_id,
            qty_per_unit,
        };
        tables.bom.push(line.clone());
        Ok(line)
    }

    pub async fn set_material_active(&self, id: i64, active: bool) -> bool {
        let mut tables = self.tables.write().await;
        match tables.materials.get_mut(&id) {
            Some(material) => {
                material.active = active;
                true
            }
            None => false,
        }
    }

    /// Delete a material from the catalog; ledger rows referring to it remain
    pub async fn remove_material(&self, id: i64) -> bool {
        self.tables.write().await.materials.remove(&id).is_some()
    }

    /// Delete a location from the catalog; ledger rows referring to it remain
    pub async fn remove_location(&self, id: i64) -> bool {
        self.tables.write().await.locations.remove(&id).is_some()
    }
}

/// Inspection and failure hooks for tests. Enabled by the `test-util`
/// feature.
#[cfg(any(test, feature = "test-util"))]
impl MemoryStore {
    /// Every ledger row in append order
    pub async fn ledger_entries(&self) -> Vec<LedgerEntry> {
        self.tables.read().await.entries.clone()
    }

    pub async fn audit_records(&self) -> Vec<AuditRecord> {
        self.tables.read().await.audit.clone()
    }

    pub async fn header_counts(&self) -> (usize, usize, usize) {
        let tables = self.tables.read().await;
        (
            tables.receipts.len(),
            tables.production_runs.len(),
            tables.shipments.len(),
        )
    }

    /// Make subsequent audit appends fail
    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn find_material(&self, id: i64) -> AppResult<Option<Material>> {
        Ok(self.tables.read().await.materials.get(&id).cloned())
    }

    async fn find_product(&self, id: i64) -> AppResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn find_bom(&self, product_id: i64) -> AppResult<Vec<BomLine>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bom
            .iter()
            .filter(|line| line.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn find_location(&self, id: i64) -> AppResult<Option<Location>> {
        Ok(self.tables.read().await.locations.get(&id).cloned())
    }

    async fn list_active_materials(&self) -> AppResult<Vec<Material>> {
        let tables = self.tables.read().await;
        Ok(tables
            .materials
            .values()
            .filter(|m| m.active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn append_entries(&self, entries: Vec<NewLedgerEntry>) -> AppResult<Vec<LedgerEntry>> {
        if entries.is_empty() {
            return Err(AppError::validation(
                "entries",
                "At least one ledger entry is required",
            ));
        }

        let mut tables = self.tables.write().await;
        let mut seq = tables.seq;
        let staged = stage_entries(&mut seq, None, entries)?;

        tables.seq = seq;
        tables.entries.extend(staged.iter().cloned());
        Ok(staged)
    }

    async fn insert_receipt(
        &self,
        receipt: NewReceipt,
        lines: Vec<NewReceiptLine>,
        entries: Vec<NewLedgerEntry>,
    ) -> AppResult<(Receipt, Vec<LedgerEntry>)> {
        let mut tables = self.tables.write().await;
        let mut seq = tables.seq;

        let receipt_id = next(&mut seq.receipt);
        let lines = lines
            .into_iter()
            .map(|line| {
                storable("receipt_lines.qty", line.qty)?;
                Ok(ReceiptLine {
                    id: next(&mut seq.receipt_line),
                    receipt_id,
                    material_id: line.material_id,
                    qty: line.qty,
                    location_id: line.location_id,
                    material: None,
                    location: None,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        let staged = stage_entries(&mut seq, Some(receipt_id), entries)?;

        let receipt = Receipt {
            id: receipt_id,
            supplier_name: receipt.supplier_name,
            user_id: receipt.user_id,
            received_at: receipt.received_at,
            created_at: Utc::now(),
            lines,
        };

        tables.seq = seq;
        tables.receipts.insert(receipt_id, receipt.clone());
        tables.entries.extend(staged.iter().cloned());
        Ok((receipt, staged))
    }

    async fn insert_production_run(
        &self,
        run: NewProductionRun,
        entries: Vec<NewLedgerEntry>,
    ) -> AppResult<(ProductionRun, Vec<LedgerEntry>)> {
        let mut tables = self.tables.write().await;
        let mut seq = tables.seq;

        storable("production_runs.quantity_produced", run.quantity_produced)?;
        let run_id = next(&mut seq.production_run);
        let staged = stage_entries(&mut seq, Some(run_id), entries)?;

        let run = ProductionRun {
            id: run_id,
            product_id: run.product_id,
            quantity_produced: run.quantity_produced,
            location_id: run.location_id,
            user_id: run.user_id,
            started_at: run.started_at,
            completed_at: run.completed_at,
            notes: run.notes,
            created_at: Utc::now(),
            product: None,
        };

        tables.seq = seq;
        tables.production_runs.insert(run_id, run.clone());
        tables.entries.extend(staged.iter().cloned());
        Ok((run, staged))
    }

    async fn insert_shipment(
        &self,
        shipment: NewShipment,
        lines: Vec<NewShipmentLine>,
        entries: Vec<NewLedgerEntry>,
    ) -> AppResult<(Shipment, Vec<LedgerEntry>)> {
        let mut tables = self.tables.write().await;
        let mut seq = tables.seq;

        let shipment_id = next(&mut seq.shipment);
        let lines = lines
            .into_iter()
            .map(|line| {
                storable("shipment_lines.qty", line.qty)?;
                Ok(ShipmentLine {
                    id: next(&mut seq.shipment_line),
                    shipment_id,
                    product_id: line.product_id,
                    qty: line.qty,
                    location_id: line.location_id,
                    product: None,
                    location: None,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        let staged = stage_entries(&mut seq, Some(shipment_id), entries)?;

        let shipment = Shipment {
            id: shipment_id,
            customer_name: shipment.customer_name,
            user_id: shipment.user_id,
            shipped_at: shipment.shipped_at,
            created_at: Utc::now(),
            lines,
        };

        tables.seq = seq;
        tables.shipments.insert(shipment_id, shipment.clone());
        tables.entries.extend(staged.iter().cloned());
        Ok((shipment, staged))
    }

    async fn balances(&self, filter: StockFilter) -> AppResult<Vec<StockBalance>> {
        let tables = self.tables.read().await;
        let balances = aggregate_balances(tables.entries.iter().filter(|e| filter.matches(e)));
        Ok(balances
            .into_iter()
            .map(|(key, quantity)| StockBalance { key, quantity })
            .collect())
    }

    async fn entries(&self, filter: EntryFilter, limit: u32) -> AppResult<Vec<LedgerEntry>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<LedgerEntry> = tables
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn list_receipts(&self) -> AppResult<Vec<Receipt>> {
        let tables = self.tables.read().await;
        let mut receipts: Vec<Receipt> = tables.receipts.values().cloned().collect();
        receipts.sort_by(|a, b| b.received_at.cmp(&a.received_at).then(b.id.cmp(&a.id)));
        Ok(receipts)
    }

    async fn find_receipt(&self, id: i64) -> AppResult<Option<Receipt>> {
        Ok(self.tables.read().await.receipts.get(&id).cloned())
    }

    async fn delete_receipt(&self, id: i64) -> AppResult<bool> {
        Ok(self.tables.write().await.receipts.remove(&id).is_some())
    }

    async fn list_production_runs(&self) -> AppResult<Vec<ProductionRun>> {
        let tables = self.tables.read().await;
        let mut runs: Vec<ProductionRun> = tables.production_runs.values().cloned().collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        Ok(runs)
    }

    async fn find_production_run(&self, id: i64) -> AppResult<Option<ProductionRun>> {
        Ok(self.tables.read().await.production_runs.get(&id).cloned())
    }

    async fn delete_production_run(&self, id: i64) -> AppResult<bool> {
        Ok(self.tables.write().await.production_runs.remove(&id).is_some())
    }

    async fn list_shipments(&self) -> AppResult<Vec<Shipment>> {
        let tables = self.tables.read().await;
        let mut shipments: Vec<Shipment> = tables.shipments.values().cloned().collect();
        shipments.sort_by(|a, b| b.shipped_at.cmp(&a.shipped_at).then(b.id.cmp(&a.id)));
        Ok(shipments)
    }

    async fn find_shipment(&self, id: i64) -> AppResult<Option<Shipment>> {
        Ok(self.tables.read().await.shipments.get(&id).cloned())
    }

    async fn delete_shipment(&self, id: i64) -> AppResult<bool> {
        Ok(self.tables.write().await.shipments.remove(&id).is_some())
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn append(&self, record: AuditRecord) -> AppResult<()> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(AppError::Storage("audit_logs is unavailable".to_string()));
        }
        self.tables.write().await.audit.push(record);
        Ok(())
    }
}
