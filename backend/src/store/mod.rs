//! Repository interfaces and their storage backends
//!
//! Services depend only on the traits here. `postgres` is the production
//! backend; `memory` keeps everything in process and is what the test-suite
//! and `storage.backend = "memory"` run against.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    AuditRecord, BomLine, EntryFilter, Item, ItemKind, LedgerEntry, Location, Material,
    NewLedgerEntry, NewProductionRun, NewReceipt, NewReceiptLine, NewShipment, NewShipmentLine,
    Product, ProductionRun, Receipt, Shipment, StockBalance, StockFilter,
};

use crate::error::{AppError, AppResult};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Read access to reference data
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_material(&self, id: i64) -> AppResult<Option<Material>>;

    async fn find_product(&self, id: i64) -> AppResult<Option<Product>>;

    /// BOM lines of a product in insertion order
    async fn find_bom(&self, product_id: i64) -> AppResult<Vec<BomLine>>;

    async fn find_location(&self, id: i64) -> AppResult<Option<Location>>;

    /// Active materials ordered by id
    async fn list_active_materials(&self) -> AppResult<Vec<Material>>;

    async fn find_item(&self, kind: ItemKind, id: i64) -> AppResult<Option<Item>> {
        Ok(match kind {
            ItemKind::Material => self.find_material(id).await?.map(Item::Material),
            ItemKind::Product => self.find_product(id).await?.map(Item::Product),
        })
    }

    async fn resolve_material(&self, id: i64) -> AppResult<Material> {
        self.find_material(id)
            .await?
            .ok_or_else(|| AppError::not_found("Material", id))
    }

    /// Resolve a product together with its bill of materials
    async fn resolve_product(&self, id: i64) -> AppResult<(Product, Vec<BomLine>)> {
        let product = self
            .find_product(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))?;
        let bom = self.find_bom(id).await?;
        Ok((product, bom))
    }

    async fn resolve_location(&self, id: i64) -> AppResult<Location> {
        self.find_location(id)
            .await?
            .ok_or_else(|| AppError::not_found("Location", id))
    }
}

/// The append-only inventory ledger and the headers that write to it.
///
/// Every write method is one atomic unit: either the header, its lines and
/// all ledger rows are persisted, or none of them are.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Append a non-empty batch of header-less (manual) rows
    async fn append_entries(&self, entries: Vec<NewLedgerEntry>) -> AppResult<Vec<LedgerEntry>>;

    async fn insert_receipt(
        &self,
        receipt: NewReceipt,
        lines: Vec<NewReceiptLine>,
        entries: Vec<NewLedgerEntry>,
    ) -> AppResult<(Receipt, Vec<LedgerEntry>)>;

    async fn insert_production_run(
        &self,
        run: NewProductionRun,
        entries: Vec<NewLedgerEntry>,
    ) -> AppResult<(ProductionRun, Vec<LedgerEntry>)>;

    async fn insert_shipment(
        &self,
        shipment: NewShipment,
        lines: Vec<NewShipmentLine>,
        entries: Vec<NewLedgerEntry>,
    ) -> AppResult<(Shipment, Vec<LedgerEntry>)>;

    /// Signed sums per (item kind, item id, location), zero sums included, unordered
    async fn balances(&self, filter: StockFilter) -> AppResult<Vec<StockBalance>>;

    /// Matching rows, newest event first, at most `limit`
    async fn entries(&self, filter: EntryFilter, limit: u32) -> AppResult<Vec<LedgerEntry>>;

    async fn list_receipts(&self) -> AppResult<Vec<Receipt>>;

    async fn find_receipt(&self, id: i64) -> AppResult<Option<Receipt>>;

    /// Remove a receipt and its lines; ledger rows are left in place
    async fn delete_receipt(&self, id: i64) -> AppResult<bool>;

    async fn list_production_runs(&self) -> AppResult<Vec<ProductionRun>>;

    async fn find_production_run(&self, id: i64) -> AppResult<Option<ProductionRun>>;

    /// Remove a production run header; ledger rows are left in place
    async fn delete_production_run(&self, id: i64) -> AppResult<bool>;

    async fn list_shipments(&self) -> AppResult<Vec<Shipment>>;

    async fn find_shipment(&self, id: i64) -> AppResult<Option<Shipment>>;

    /// Remove a shipment and its lines; ledger rows are left in place
    async fn delete_shipment(&self, id: i64) -> AppResult<bool>;
}

/// Sink for audit trail records
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, record: AuditRecord) -> AppResult<()>;
}

/// The three repositories of one backend, shared behind trait objects
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn CatalogRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub audit: Arc<dyn AuditRepository>,
}

impl Stores {
    pub fn from_backend<S>(store: Arc<S>) -> Self
    where
        S: CatalogRepository + LedgerRepository + AuditRepository + 'static,
    {
        Self {
            catalog: store.clone(),
            ledger: store.clone(),
            audit: store,
        }
    }
}
