//! HTTP handlers for inventory ledger endpoints

use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{DateRange, EntryFilter, ItemStock, LedgerEntry, LowStockMaterial, StockLevel, UserActivity};

use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::middleware::CurrentActor;
use crate::services::{
    parse_item_kind, AdjustInventoryInput, AdjustmentService, LedgerService, StockQuery,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockParams {
    pub item_kind: Option<String>,
    pub location_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    pub item_kind: Option<String>,
    pub item_id: Option<i64>,
    pub location_id: Option<i64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityParams {
    pub user_id: Option<i64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Current non-zero stock, optionally by item kind and location
pub async fn get_current_stock(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Query(params): Query<StockParams>,
) -> AppResult<Json<Vec<StockLevel>>> {
    let item_kind = params
        .item_kind
        .as_deref()
        .map(|k| parse_item_kind("itemKind", k))
        .transpose()?;

    let service = LedgerService::from_state(&state);
    let stock = service
        .current_stock(StockQuery {
            item_kind,
            location_id: params.location_id,
        })
        .await?;
    Ok(Json(stock))
}

/// Per-location stock and total for one item
pub async fn get_item_stock(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Path((item_kind, item_id)): Path<(String, i64)>,
) -> AppResult<Json<ItemStock>> {
    let item_kind = parse_item_kind("itemKind", &item_kind)?;

    let service = LedgerService::from_state(&state);
    let stock = service.stock_for_item(item_kind, item_id).await?;
    Ok(Json(stock))
}

/// Ledger rows, newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Query(params): Query<TransactionParams>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let item_kind = params
        .item_kind
        .as_deref()
        .map(|k| parse_item_kind("itemKind", k))
        .transpose()?;
    let filter = EntryFilter {
        item_kind,
        item_id: params.item_id,
        location_id: params.location_id,
        user_id: None,
        range: DateRange::new(params.start, params.end),
    };

    let service = LedgerService::from_state(&state);
    let transactions = service.transaction_history(filter, params.limit).await?;
    Ok(Json(transactions))
}

/// Active materials below their minimum stock
pub async fn get_low_stock(
    State(state): State<AppState>,
    _actor: CurrentActor,
) -> AppResult<Json<Vec<LowStockMaterial>>> {
    let service = LedgerService::from_state(&state);
    let materials = service.low_stock_materials().await?;
    Ok(Json(materials))
}

/// Recent ledger activity grouped by user
pub async fn get_user_activity(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Query(params): Query<ActivityParams>,
) -> AppResult<Json<UserActivity>> {
    let service = LedgerService::from_state(&state);
    let activity = service
        .user_activity(params.user_id, DateRange::new(params.start, params.end))
        .await?;
    Ok(Json(activity))
}

/// Manual stock adjustment (admin only)
pub async fn adjust_inventory(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<AdjustInventoryInput>,
) -> AppResult<(StatusCode, Json<LedgerEntry>)> {
    let service = AdjustmentService::from_state(&state);
    let entry = service.adjust(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
