//! Stock queries over the inventory ledger
//!
//! Stock is re-derived from ledger rows on every call. All balance reads go
//! through the same policy: exact zeros are dropped, rows are ordered by
//! item kind, item id and location id, and item/location details are joined
//! best-effort (a missing reference yields `null`, never an error).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;
use shared::ledger::{reportable_balances, totals_by_item};
use shared::{
    DateRange, EntryFilter, ItemKind, ItemStock, ItemSummary, LedgerEntry, LocationStock,
    LocationSummary, LowStockMaterial, StockFilter, StockLevel, UserActivity,
    UserActivitySummary,
};

use crate::config::LedgerConfig;
use crate::error::{AppError, AppResult};
use crate::store::{CatalogRepository, LedgerRepository};
use crate::AppState;

/// Filter accepted by [`LedgerService::current_stock`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StockQuery {
    pub item_kind: Option<ItemKind>,
    pub location_id: Option<i64>,
}

/// Read side of the inventory ledger
#[derive(Clone)]
pub struct LedgerService {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn LedgerRepository>,
    limits: LedgerConfig,
}

/// Per-call lookup cache for the best-effort joins
struct Enricher<'a> {
    catalog: &'a dyn CatalogRepository,
    items: HashMap<(ItemKind, i64), Option<ItemSummary>>,
    locations: HashMap<i64, Option<LocationSummary>>,
}

impl<'a> Enricher<'a> {
    fn new(catalog: &'a dyn CatalogRepository) -> Self {
        Self {
            catalog,
            items: HashMap::new(),
            locations: HashMap::new(),
        }
    }

    async fn item(&mut self, kind: ItemKind, id: i64) -> AppResult<Option<ItemSummary>> {
        if let Some(cached) = self.items.get(&(kind, id)) {
            return Ok(cached.clone());
        }
        let summary = self.catalog.find_item(kind, id).await?.map(|i| i.summary());
        self.items.insert((kind, id), summary.clone());
        Ok(summary)
    }

    async fn location(&mut self, id: i64) -> AppResult<Option<LocationSummary>> {
        if let Some(cached) = self.locations.get(&id) {
            return Ok(cached.clone());
        }
        let summary = self
            .catalog
            .find_location(id)
            .await?
            .map(|l| LocationSummary::from(&l));
        self.locations.insert(id, summary.clone());
        Ok(summary)
    }
}

impl LedgerService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        ledger: Arc<dyn LedgerRepository>,
        limits: LedgerConfig,
    ) -> Self {
        Self {
            catalog,
            ledger,
            limits,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.catalog.clone(),
            state.ledger.clone(),
            state.config.ledger.clone(),
        )
    }

    /// Non-zero balances per item and location
    pub async fn current_stock(&self, query: StockQuery) -> AppResult<Vec<StockLevel>> {
        let balances = self
            .ledger
            .balances(StockFilter {
                item_kind: query.item_kind,
                item_id: None,
                location_id: query.location_id,
            })
            .await?;

        let mut enricher = Enricher::new(self.catalog.as_ref());
        let mut levels = Vec::new();
        for balance in reportable_balances(balances) {
            let key = balance.key;
            levels.push(StockLevel {
                item_kind: key.item_kind,
                item_id: key.item_id,
                location_id: key.location_id,
                current_stock: balance.quantity,
                item: enricher.item(key.item_kind, key.item_id).await?,
                location: enricher.location(key.location_id).await?,
            });
        }
        Ok(levels)
    }

    /// Per-location breakdown and total for one item
    pub async fn stock_for_item(&self, item_kind: ItemKind, item_id: i64) -> AppResult<ItemStock> {
        let balances = self
            .ledger
            .balances(StockFilter {
                item_kind: Some(item_kind),
                item_id: Some(item_id),
                location_id: None,
            })
            .await?;

        let mut enricher = Enricher::new(self.catalog.as_ref());
        let mut stock_by_location = Vec::new();
        let mut total_stock = Decimal::ZERO;
        for balance in reportable_balances(balances) {
            total_stock += balance.quantity;
            stock_by_location.push(LocationStock {
                location_id: balance.key.location_id,
                current_stock: balance.quantity,
                location: enricher.location(balance.key.location_id).await?,
            });
        }

        Ok(ItemStock {
            item_kind,
            item_id,
            item: enricher.item(item_kind, item_id).await?,
            stock_by_location,
            total_stock,
        })
    }

    /// Matching ledger rows, newest event first
    pub async fn transaction_history(
        &self,
        filter: EntryFilter,
        limit: Option<u32>,
    ) -> AppResult<Vec<LedgerEntry>> {
        let limit = self.history_limit(limit)?;
        self.ledger.entries(filter, limit).await
    }

    fn history_limit(&self, requested: Option<u32>) -> AppResult<u32> {
        match requested {
            Some(0) => Err(AppError::validation(
                "limit",
                "limit must be greater than zero",
            )),
            Some(limit) => Ok(limit.min(self.limits.max_history_limit)),
            None => Ok(self
                .limits
                .default_history_limit
                .min(self.limits.max_history_limit)),
        }
    }

    /// Active materials whose total stock is below their minimum
    pub async fn low_stock_materials(&self) -> AppResult<Vec<LowStockMaterial>> {
        let materials = self.catalog.list_active_materials().await?;
        let balances = self
            .ledger
            .balances(StockFilter {
                item_kind: Some(ItemKind::Material),
                ..StockFilter::default()
            })
            .await?;
        let totals = totals_by_item(balances);

        Ok(materials
            .into_iter()
            .filter_map(|material| {
                let current_stock = totals.get(&material.id).copied().unwrap_or(Decimal::ZERO);
                if current_stock < material.min_stock {
                    let min_stock = material.min_stock;
                    Some(LowStockMaterial {
                        material,
                        current_stock,
                        min_stock,
                        deficit: min_stock - current_stock,
                    })
                } else {
                    None
                }
            })
            .collect())
    }

    /// Recent ledger rows and per-user transaction counts
    pub async fn user_activity(
        &self,
        user_id: Option<i64>,
        range: DateRange,
    ) -> AppResult<UserActivity> {
        let filter = EntryFilter {
            user_id,
            range,
            ..EntryFilter::default()
        };
        let transactions = self
            .ledger
            .entries(filter, self.limits.activity_window)
            .await?;

        let mut by_user: BTreeMap<i64, UserActivitySummary> = BTreeMap::new();
        for entry in &transactions {
            let summary = by_user
                .entry(entry.user_id)
                .or_insert_with(|| UserActivitySummary {
                    user_id: entry.user_id,
                    total_transactions: 0,
                    by_kind: BTreeMap::new(),
                });
            summary.total_transactions += 1;
            *summary.by_kind.entry(entry.txn_kind).or_insert(0) += 1;
        }

        Ok(UserActivity {
            transactions,
            summary: by_user.into_values().collect(),
        })
    }
}
