//! PostgreSQL storage backend
//!
//! Enum columns are stored as TEXT and decoded through the row structs below.
//! Each workflow write runs inside one database transaction.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    AuditRecord, BomLine, EntryFilter, ItemKind, LedgerEntry, Location, Material, NewLedgerEntry,
    NewProductionRun, NewReceipt, NewReceiptLine, NewShipment, NewShipmentLine, Product,
    ProductionRun, Receipt, ReceiptLine, Shipment, ShipmentLine, StockBalance, StockFilter,
    SourceKind, StockKey, TxnKind,
};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::FromRow;

use super::{AuditRepository, CatalogRepository, LedgerRepository};
use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Storage backend over a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode<T, E>(value: Result<T, E>) -> AppResult<T>
where
    E: std::fmt::Display,
{
    value.map_err(|e| AppError::Storage(format!("undecodable column: {}", e)))
}

// ============================================================================
// Row types
// ============================================================================

#[derive(FromRow)]
struct MaterialRow {
    id: i64,
    sku: String,
    name: String,
    uom: String,
    min_stock: Decimal,
    active: bool,
}

impl From<MaterialRow> for Material {
    fn from(row: MaterialRow) -> Self {
        Material {
            id: row.id,
            sku: row.sku,
            name: row.name,
            uom: row.uom,
            min_stock: row.min_stock,
            active: row.active,
        }
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    sku: String,
    name: String,
    uom: String,
    active: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            uom: row.uom,
            active: row.active,
        }
    }
}

#[derive(FromRow)]
struct LocationRow {
    id: i64,
    code: String,
    description: Option<String>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            code: row.code,
            description: row.description,
        }
    }
}

#[derive(FromRow)]
struct BomLineRow {
    id: i64,
    product_id: i64,
    material_id: i64,
    qty_per_unit: Decimal,
}

impl From<BomLineRow> for BomLine {
    fn from(row: BomLineRow) -> Self {
        BomLine {
            id: row.id,
            product_id: row.product_id,
            material_id: row.material_id,
            qty_per_unit: row.qty_per_unit,
        }
    }
}

#[derive(FromRow)]
struct EntryRow {
    id: i64,
    txn_kind: String,
    source_kind: String,
    source_id: Option<i64>,
    item_kind: String,
    item_id: i64,
    quantity: Decimal,
    location_id: i64,
    user_id: i64,
    occurred_at: DateTime<Utc>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for LedgerEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> AppResult<Self> {
        Ok(LedgerEntry {
            id: row.id,
            txn_kind: decode(row.txn_kind.parse::<TxnKind>())?,
            source_kind: decode(row.source_kind.parse::<SourceKind>())?,
            source_id: row.source_id,
            item_kind: decode(row.item_kind.parse::<ItemKind>())?,
            item_id: row.item_id,
            quantity: row.quantity,
            location_id: row.location_id,
            user_id: row.user_id,
            occurred_at: row.occurred_at,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct BalanceRow {
    item_kind: String,
    item_id: i64,
    location_id: i64,
    quantity: Decimal,
}

#[derive(FromRow)]
struct ReceiptRow {
    id: i64,
    supplier_name: String,
    user_id: i64,
    received_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl ReceiptRow {
    fn with_lines(self, lines: Vec<ReceiptLine>) -> Receipt {
        Receipt {
            id: self.id,
            supplier_name: self.supplier_name,
            user_id: self.user_id,
            received_at: self.received_at,
            created_at: self.created_at,
            lines,
        }
    }
}

#[derive(FromRow)]
struct ReceiptLineRow {
    id: i64,
    receipt_id: i64,
    material_id: i64,
    qty: Decimal,
    location_id: i64,
}

impl From<ReceiptLineRow> for ReceiptLine {
    fn from(row: ReceiptLineRow) -> Self {
        ReceiptLine {
            id: row.id,
            receipt_id: row.receipt_id,
            material_id: row.material_id,
            qty: row.qty,
            location_id: row.location_id,
            material: None,
            location: None,
        }
    }
}

#[derive(FromRow)]
struct ProductionRunRow {
    id: i64,
    product_id: i64,
    quantity_produced: Decimal,
    location_id: i64,
    user_id: i64,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductionRunRow> for ProductionRun {
    fn from(row: ProductionRunRow) -> Self {
        ProductionRun {
            id: row.id,
            product_id: row.product_id,
            quantity_produced: row.quantity_produced,
            location_id: row.location_id,
            user_id: row.user_id,
            started_at: row.started_at,
            completed_at: row.completed_at,
            notes: row.notes,
            created_at: row.created_at,
            product: None,
        }
    }
}

#[derive(FromRow)]
struct ShipmentRow {
    id: i64,
    customer_name: String,
    user_id: i64,
    shipped_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl ShipmentRow {
    fn with_lines(self, lines: Vec<ShipmentLine>) -> Shipment {
        Shipment {
            id: self.id,
            customer_name: self.customer_name,
            user_id: self.user_id,
            shipped_at: self.shipped_at,
            created_at: self.created_at,
            lines,
        }
    }
}

#[derive(FromRow)]
struct ShipmentLineRow {
    id: i64,
    shipment_id: i64,
    product_id: i64,
    qty: Decimal,
    location_id: i64,
}

impl From<ShipmentLineRow> for ShipmentLine {
    fn from(row: ShipmentLineRow) -> Self {
        ShipmentLine {
            id: row.id,
            shipment_id: row.shipment_id,
            product_id: row.product_id,
            qty: row.qty,
            location_id: row.location_id,
            product: None,
            location: None,
        }
    }
}

const ENTRY_COLUMNS: &str = "id, txn_kind, source_kind, source_id, item_kind, item_id, quantity, \
     location_id, user_id, occurred_at, notes, created_at";

/// Insert ledger rows on an open connection, normally inside a transaction
async fn insert_entries(
    conn: &mut PgConnection,
    source_id: Option<i64>,
    entries: Vec<NewLedgerEntry>,
) -> AppResult<Vec<LedgerEntry>> {
    let sql = format!(
        r#"
        INSERT INTO inventory_txns (
            txn_kind, source_kind, source_id, item_kind, item_id,
            quantity, location_id, user_id, occurred_at, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {}
        "#,
        ENTRY_COLUMNS
    );

    let mut written = Vec::with_capacity(entries.len());
    for entry in entries {
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(entry.txn_kind.as_str())
            .bind(entry.source_kind.as_str())
            .bind(source_id)
            .bind(entry.item_kind.as_str())
            .bind(entry.item_id)
            .bind(entry.quantity)
            .bind(entry.location_id)
            .bind(entry.user_id)
            .bind(entry.occurred_at)
            .bind(entry.notes)
            .fetch_one(&mut *conn)
            .await?;
        written.push(LedgerEntry::try_from(row)?);
    }
    Ok(written)
}

/// Group line rows under their header id, keeping id order
fn group_lines<R, L>(rows: Vec<R>, header_id: impl Fn(&R) -> i64) -> HashMap<i64, Vec<L>>
where
    L: From<R>,
{
    let mut grouped: HashMap<i64, Vec<L>> = HashMap::new();
    for row in rows {
        grouped.entry(header_id(&row)).or_default().push(L::from(row));
    }
    grouped
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn find_material(&self, id: i64) -> AppResult<Option<Material>> {
        let row = sqlx::query_as::<_, MaterialRow>(
            "SELECT id, sku, name, uom, min_stock, active FROM materials WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Material::from))
    }

    async fn find_product(&self, id: i64) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, sku, name, uom, active FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn find_bom(&self, product_id: i64) -> AppResult<Vec<BomLine>> {
        let rows = sqlx::query_as::<_, BomLineRow>(
            r#"
            SELECT id, product_id, material_id, qty_per_unit
            FROM bom_lines
            WHERE product_id = $1
            ORDER BY id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(BomLine::from).collect())
    }

    async fn find_location(&self, id: i64) -> AppResult<Option<Location>> {
        let row = sqlx::query_as::<_, LocationRow>(
            "SELECT id, code, description FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Location::from))
    }

    async fn list_active_materials(&self) -> AppResult<Vec<Material>> {
        let rows = sqlx::query_as::<_, MaterialRow>(
            r#"
            SELECT id, sku, name, uom, min_stock, active
            FROM materials
            WHERE active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Material::from).collect())
    }
}

#[async_trait]
impl LedgerRepository for PgStore {
    async fn append_entries(&self, entries: Vec<NewLedgerEntry>) -> AppResult<Vec<LedgerEntry>> {
        if entries.is_empty() {
            return Err(AppError::validation(
                "entries",
                "At least one ledger entry is required",
            ));
        }

        let mut tx = self.pool.begin().await?;
        let written = insert_entries(&mut *tx, None, entries).await?;
        tx.commit().await?;

        Ok(written)
    }

    async fn insert_receipt(
        &self,
        receipt: NewReceipt,
        lines: Vec<NewReceiptLine>,
        entries: Vec<NewLedgerEntry>,
    ) -> AppResult<(Receipt, Vec<LedgerEntry>)> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, ReceiptRow>(
            r#"
            INSERT INTO receipts (supplier_name, user_id, received_at)
            VALUES ($1, $2, $3)
            RETURNING id, supplier_name, user_id, received_at, created_at
            "#,
        )
        .bind(&receipt.supplier_name)
        .bind(receipt.user_id)
        .bind(receipt.received_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut written_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let row = sqlx::query_as::<_, ReceiptLineRow>(
                r#"
                INSERT INTO receipt_lines (receipt_id, material_id, qty, location_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id, receipt_id, material_id, qty, location_id
                "#,
            )
            .bind(header.id)
            .bind(line.material_id)
            .bind(line.qty)
            .bind(line.location_id)
            .fetch_one(&mut *tx)
            .await?;
            written_lines.push(ReceiptLine::from(row));
        }

        let written = insert_entries(&mut *tx, Some(header.id), entries).await?;
        tx.commit().await?;

        Ok((header.with_lines(written_lines), written))
    }

    async fn insert_production_run(
        &self,
        run: NewProductionRun,
        entries: Vec<NewLedgerEntry>,
    ) -> AppResult<(ProductionRun, Vec<LedgerEntry>)> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, ProductionRunRow>(
            r#"
            INSERT INTO production_runs (
                product_id, quantity_produced, location_id, user_id,
                started_at, completed_at, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, product_id, quantity_produced, location_id, user_id,
                      started_at, completed_at, notes, created_at
            "#,
        )
        .bind(run.product_id)
        .bind(run.quantity_produced)
        .bind(run.location_id)
        .bind(run.user_id)
        .bind(run.started_at)
        .bind(run.completed_at)
        .bind(&run.notes)
        .fetch_one(&mut *tx)
        .await?;

        let written = insert_entries(&mut *tx, Some(header.id), entries).await?;
        tx.commit().await?;

        Ok((ProductionRun::from(header), written))
    }

    async fn insert_shipment(
        &self,
        shipment: NewShipment,
        lines: Vec<NewShipmentLine>,
        entries: Vec<NewLedgerEntry>,
    ) -> AppResult<(Shipment, Vec<LedgerEntry>)> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, ShipmentRow>(
            r#"
            INSERT INTO shipments (customer_name, user_id, shipped_at)
            VALUES ($1, $2, $3)
            RETURNING id, customer_name, user_id, shipped_at, created_at
            "#,
        )
        .bind(&shipment.customer_name)
        .bind(shipment.user_id)
        .bind(shipment.shipped_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut written_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let row = sqlx::query_as::<_, ShipmentLineRow>(
                r#"
                INSERT INTO shipment_lines (shipment_id, product_id, qty, location_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id, shipment_id, product_id, qty, location_id
                "#,
            )
            .bind(header.id)
            .bind(line.product_id)
            .bind(line.qty)
            .bind(line.location_id)
            .fetch_one(&mut *tx)
            .await?;
            written_lines.push(ShipmentLine::from(row));
        }

        let written = insert_entries(&mut *tx, Some(header.id), entries).await?;
        tx.commit().await?;

        Ok((header.with_lines(written_lines), written))
    }

    async fn balances(&self, filter: StockFilter) -> AppResult<Vec<StockBalance>> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT item_kind, item_id, location_id, SUM(quantity) AS quantity
            FROM inventory_txns
            WHERE ($1::text IS NULL OR item_kind = $1)
              AND ($2::bigint IS NULL OR item_id = $2)
              AND ($3::bigint IS NULL OR location_id = $3)
            GROUP BY item_kind, item_id, location_id
            "#,
        )
        .bind(filter.item_kind.map(|k| k.as_str()))
        .bind(filter.item_id)
        .bind(filter.location_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(StockBalance {
                    key: StockKey {
                        item_kind: decode(row.item_kind.parse::<ItemKind>())?,
                        item_id: row.item_id,
                        location_id: row.location_id,
                    },
                    quantity: row.quantity,
                })
            })
            .collect()
    }

    async fn entries(&self, filter: EntryFilter, limit: u32) -> AppResult<Vec<LedgerEntry>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM inventory_txns
            WHERE ($1::text IS NULL OR item_kind = $1)
              AND ($2::bigint IS NULL OR item_id = $2)
              AND ($3::bigint IS NULL OR location_id = $3)
              AND ($4::bigint IS NULL OR user_id = $4)
              AND ($5::timestamptz IS NULL OR occurred_at >= $5)
              AND ($6::timestamptz IS NULL OR occurred_at <= $6)
            ORDER BY occurred_at DESC, id DESC
            LIMIT $7
            "#,
            ENTRY_COLUMNS
        );

        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(filter.item_kind.map(|k| k.as_str()))
            .bind(filter.item_id)
            .bind(filter.location_id)
            .bind(filter.user_id)
            .bind(filter.range.start)
            .bind(filter.range.end)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    async fn list_receipts(&self) -> AppResult<Vec<Receipt>> {
        let headers = sqlx::query_as::<_, ReceiptRow>(
            r#"
            SELECT id, supplier_name, user_id, received_at, created_at
            FROM receipts
            ORDER BY received_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = headers.iter().map(|h| h.id).collect();
        let lines = sqlx::query_as::<_, ReceiptLineRow>(
            r#"
            SELECT id, receipt_id, material_id, qty, location_id
            FROM receipt_lines
            WHERE receipt_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let mut lines = group_lines::<_, ReceiptLine>(lines, |l| l.receipt_id);

        Ok(headers
            .into_iter()
            .map(|h| {
                let own = lines.remove(&h.id).unwrap_or_default();
                h.with_lines(own)
            })
            .collect())
    }

    async fn find_receipt(&self, id: i64) -> AppResult<Option<Receipt>> {
        let header = sqlx::query_as::<_, ReceiptRow>(
            "SELECT id, supplier_name, user_id, received_at, created_at FROM receipts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, ReceiptLineRow>(
            r#"
            SELECT id, receipt_id, material_id, qty, location_id
            FROM receipt_lines
            WHERE receipt_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(header.with_lines(
            lines.into_iter().map(ReceiptLine::from).collect(),
        )))
    }

    async fn delete_receipt(&self, id: i64) -> AppResult<bool> {
        // receipt_lines cascade; inventory_txns has no foreign key to headers
        let result = sqlx::query("DELETE FROM receipts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_production_runs(&self) -> AppResult<Vec<ProductionRun>> {
        let rows = sqlx::query_as::<_, ProductionRunRow>(
            r#"
            SELECT id, product_id, quantity_produced, location_id, user_id,
                   started_at, completed_at, notes, created_at
            FROM production_runs
            ORDER BY started_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProductionRun::from).collect())
    }

    async fn find_production_run(&self, id: i64) -> AppResult<Option<ProductionRun>> {
        let row = sqlx::query_as::<_, ProductionRunRow>(
            r#"
            SELECT id, product_id, quantity_produced, location_id, user_id,
                   started_at, completed_at, notes, created_at
            FROM production_runs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ProductionRun::from))
    }

    async fn delete_production_run(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM production_runs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_shipments(&self) -> AppResult<Vec<Shipment>> {
        let headers = sqlx::query_as::<_, ShipmentRow>(
            r#"
            SELECT id, customer_name, user_id, shipped_at, created_at
            FROM shipments
            ORDER BY shipped_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = headers.iter().map(|h| h.id).collect();
        let lines = sqlx::query_as::<_, ShipmentLineRow>(
            r#"
            SELECT id, shipment_id, product_id, qty, location_id
            FROM shipment_lines
            WHERE shipment_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let mut lines = group_lines::<_, ShipmentLine>(lines, |l| l.shipment_id);

        Ok(headers
            .into_iter()
            .map(|h| {
                let own = lines.remove(&h.id).unwrap_or_default();
                h.with_lines(own)
            })
            .collect())
    }

    async fn find_shipment(&self, id: i64) -> AppResult<Option<Shipment>> {
        let header = sqlx::query_as::<_, ShipmentRow>(
            "SELECT id, customer_name, user_id, shipped_at, created_at FROM shipments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, ShipmentLineRow>(
            r#"
            SELECT id, shipment_id, product_id, qty, location_id
            FROM shipment_lines
            WHERE shipment_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(header.with_lines(
            lines.into_iter().map(ShipmentLine::from).collect(),
        )))
    }

    async fn delete_shipment(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM shipments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AuditRepository for PgStore {
    async fn append(&self, record: AuditRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (actor_id, action, entity_kind, entity_id, description, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.actor_id)
        .bind(record.action.as_str())
        .bind(record.entity_kind.as_str())
        .bind(record.entity_id)
        .bind(&record.description)
        .bind(&record.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
