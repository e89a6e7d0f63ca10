//! Inventory ledger rows and derived stock views

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ItemSummary, LocationSummary, Material};
use crate::types::{DateRange, ItemKind, SourceKind, TxnKind};

/// One immutable ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: i64,
    pub txn_kind: TxnKind,
    pub source_kind: SourceKind,
    /// Header that produced the row; absent for manual adjustments and
    /// possibly dangling once the header has been deleted
    pub source_id: Option<i64>,
    pub item_kind: ItemKind,
    pub item_id: i64,
    /// Signed: positive adds stock, negative removes it
    pub quantity: Decimal,
    pub location_id: i64,
    pub user_id: i64,
    /// Business time of the event
    pub occurred_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A ledger row before the store has assigned its id and source header
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub txn_kind: TxnKind,
    pub source_kind: SourceKind,
    pub item_kind: ItemKind,
    pub item_id: i64,
    pub quantity: Decimal,
    pub location_id: i64,
    pub user_id: i64,
    pub occurred_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Identity of one derived balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockKey {
    pub item_kind: ItemKind,
    pub item_id: i64,
    pub location_id: i64,
}

impl StockKey {
    pub fn of(entry: &LedgerEntry) -> Self {
        Self {
            item_kind: entry.item_kind,
            item_id: entry.item_id,
            location_id: entry.location_id,
        }
    }
}

/// Raw signed sum for one key, zero sums included
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockBalance {
    pub key: StockKey,
    pub quantity: Decimal,
}

/// Filter for balance aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockFilter {
    pub item_kind: Option<ItemKind>,
    pub item_id: Option<i64>,
    pub location_id: Option<i64>,
}

impl StockFilter {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.item_kind.map_or(true, |k| entry.item_kind == k)
            && self.item_id.map_or(true, |id| entry.item_id == id)
            && self.location_id.map_or(true, |id| entry.location_id == id)
    }
}

/// Filter for ledger row listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub item_kind: Option<ItemKind>,
    pub item_id: Option<i64>,
    pub location_id: Option<i64>,
    pub user_id: Option<i64>,
    pub range: DateRange,
}

impl EntryFilter {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.item_kind.map_or(true, |k| entry.item_kind == k)
            && self.item_id.map_or(true, |id| entry.item_id == id)
            && self.location_id.map_or(true, |id| entry.location_id == id)
            && self.user_id.map_or(true, |id| entry.user_id == id)
            && self.range.contains(entry.occurred_at)
    }
}

/// Current non-zero stock for one item at one location
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub item_kind: ItemKind,
    pub item_id: i64,
    pub location_id: i64,
    pub current_stock: Decimal,
    pub item: Option<ItemSummary>,
    pub location: Option<LocationSummary>,
}

/// Stock at one location inside a per-item breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStock {
    pub location_id: i64,
    pub current_stock: Decimal,
    pub location: Option<LocationSummary>,
}

/// Per-location breakdown for one item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStock {
    pub item_kind: ItemKind,
    pub item_id: i64,
    pub item: Option<ItemSummary>,
    pub stock_by_location: Vec<LocationStock>,
    pub total_stock: Decimal,
}

/// A material whose total stock is below its minimum
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockMaterial {
    pub material: Material,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub deficit: Decimal,
}

/// Transaction counts for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivitySummary {
    pub user_id: i64,
    pub total_transactions: u64,
    pub by_kind: BTreeMap<TxnKind, u64>,
}

/// Recent ledger rows plus per-user counts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub transactions: Vec<LedgerEntry>,
    pub summary: Vec<UserActivitySummary>,
}

/// A created header together with the ledger rows it wrote
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Posted<T> {
    #[serde(flatten)]
    pub record: T,
    pub ledger_entries: Vec<LedgerEntry>,
}
