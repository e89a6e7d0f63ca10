//! Ledger arithmetic
//!
//! Stock is never stored: it is the signed sum of ledger rows per
//! `(item kind, item id, location)`. This module holds that one summation,
//! the reporting policy applied on top of it, and the constructors that fix
//! the sign convention of every workflow.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{
    BomLine, LedgerEntry, NewLedgerEntry, NewProductionRun, NewReceiptLine, NewShipmentLine,
    StockBalance, StockKey,
};
use crate::types::{ItemKind, SourceKind, TxnKind};
use crate::validation::{normalize_quantity, QuantityError};

/// Sum ledger rows per stock key. Zero sums are kept.
pub fn aggregate_balances<'a, I>(entries: I) -> BTreeMap<StockKey, Decimal>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut balances = BTreeMap::new();
    for entry in entries {
        *balances.entry(StockKey::of(entry)).or_insert(Decimal::ZERO) += entry.quantity;
    }
    balances
}

/// Drop balances that sum to exactly zero and order the rest by
/// item kind, item id, then location id.
pub fn reportable_balances(balances: impl IntoIterator<Item = StockBalance>) -> Vec<StockBalance> {
    let mut rows: Vec<StockBalance> = balances
        .into_iter()
        .filter(|b| !b.quantity.is_zero())
        .collect();
    rows.sort_by_key(|b| b.key);
    rows
}

/// Total per item id across every location, zero and negative totals included
pub fn totals_by_item(balances: impl IntoIterator<Item = StockBalance>) -> BTreeMap<i64, Decimal> {
    let mut totals = BTreeMap::new();
    for balance in balances {
        *totals.entry(balance.key.item_id).or_insert(Decimal::ZERO) += balance.quantity;
    }
    totals
}

/// Ledger row for one received material line: stock goes up by the line quantity
pub fn receipt_entry(
    line: &NewReceiptLine,
    user_id: i64,
    received_at: DateTime<Utc>,
) -> NewLedgerEntry {
    NewLedgerEntry {
        txn_kind: TxnKind::MaterialIn,
        source_kind: SourceKind::Receipt,
        item_kind: ItemKind::Material,
        item_id: line.material_id,
        quantity: normalize_quantity(line.qty),
        location_id: line.location_id,
        user_id,
        occurred_at: received_at,
        notes: None,
    }
}

/// Ledger row for one shipped product line. The line keeps the quantity as
/// entered; the ledger receives its negation.
pub fn shipment_entry(
    line: &NewShipmentLine,
    user_id: i64,
    shipped_at: DateTime<Utc>,
) -> NewLedgerEntry {
    NewLedgerEntry {
        txn_kind: TxnKind::ProductOut,
        source_kind: SourceKind::Shipment,
        item_kind: ItemKind::Product,
        item_id: line.product_id,
        quantity: -normalize_quantity(line.qty),
        location_id: line.location_id,
        user_id,
        occurred_at: shipped_at,
        notes: None,
    }
}

/// Ledger rows for a production run: one consumption per BOM line
/// (`-(qty_per_unit * quantity_produced)`) followed by one product output.
/// Every row is stamped at the run's completion time and location.
///
/// Fails with [`QuantityError::OutOfRange`] when a consumption does not fit
/// a decimal.
pub fn production_entries(
    run: &NewProductionRun,
    bom: &[BomLine],
) -> Result<Vec<NewLedgerEntry>, QuantityError> {
    let mut entries = Vec::with_capacity(bom.len() + 1);

    for line in bom {
        let consumed = line
            .qty_per_unit
            .checked_mul(run.quantity_produced)
            .map(normalize_quantity)
            .ok_or(QuantityError::OutOfRange)?;
        entries.push(NewLedgerEntry {
            txn_kind: TxnKind::MaterialConsume,
            source_kind: SourceKind::Production,
            item_kind: ItemKind::Material,
            item_id: line.material_id,
            quantity: -consumed,
            location_id: run.location_id,
            user_id: run.user_id,
            occurred_at: run.completed_at,
            notes: None,
        });
    }

    entries.push(NewLedgerEntry {
        txn_kind: TxnKind::ProductIn,
        source_kind: SourceKind::Production,
        item_kind: ItemKind::Product,
        item_id: run.product_id,
        quantity: normalize_quantity(run.quantity_produced),
        location_id: run.location_id,
        user_id: run.user_id,
        occurred_at: run.completed_at,
        notes: None,
    });

    Ok(entries)
}

/// Ledger row for a manual adjustment, signed as given
pub fn adjustment_entry(
    item_kind: ItemKind,
    item_id: i64,
    location_id: i64,
    quantity: Decimal,
    user_id: i64,
    occurred_at: DateTime<Utc>,
    notes: Option<String>,
) -> NewLedgerEntry {
    NewLedgerEntry {
        txn_kind: TxnKind::Adjust,
        source_kind: SourceKind::Manual,
        item_kind,
        item_id,
        quantity: normalize_quantity(quantity),
        location_id,
        user_id,
        occurred_at,
        notes,
    }
}
