//! Manual inventory adjustments (admin only)

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::ledger::adjustment_entry;
use shared::{check_storable, normalize_quantity, Actor, AuditEntityKind, AuditRecord, ItemKind, LedgerEntry};
use validator::Validate;

use super::{parse_item_kind, required};
use crate::audit::AuditSink;
use crate::error::{AppError, AppResult};
use crate::store::{CatalogRepository, LedgerRepository};
use crate::AppState;

const DEFAULT_NOTES: &str = "Manual inventory adjustment";

/// Adjustment service
#[derive(Clone)]
pub struct AdjustmentService {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn LedgerRepository>,
    audit: AuditSink,
}

/// Input for a manual adjustment; `qty` is signed
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustInventoryInput {
    pub item_kind: Option<String>,
    pub item_id: Option<i64>,
    pub location_id: Option<i64>,
    pub qty: Option<Decimal>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl AdjustmentService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        ledger: Arc<dyn LedgerRepository>,
        audit: AuditSink,
    ) -> Self {
        Self {
            catalog,
            ledger,
            audit,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.catalog.clone(), state.ledger.clone(), state.audit.clone())
    }

    /// Write one ADJUST row with no source header. Only admins may adjust.
    pub async fn adjust(&self, actor: &Actor, input: AdjustInventoryInput) -> AppResult<LedgerEntry> {
        if !actor.is_admin() {
            return Err(AppError::InsufficientPermissions);
        }

        input.validate()?;
        let kind = required("itemKind", input.item_kind.as_deref())?;
        let item_kind = parse_item_kind("itemKind", kind)?;
        let item_id = required("itemId", input.item_id)?;
        let location_id = required("locationId", input.location_id)?;
        let qty = normalize_quantity(required("qty", input.qty)?);
        check_storable(qty).map_err(|e| AppError::quantity("qty", e))?;

        if self.catalog.find_item(item_kind, item_id).await?.is_none() {
            let resource = match item_kind {
                ItemKind::Material => "Material",
                ItemKind::Product => "Product",
            };
            return Err(AppError::not_found(resource, item_id));
        }
        self.catalog.resolve_location(location_id).await?;

        let notes = input
            .notes
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_NOTES.to_string());
        let entry = adjustment_entry(
            item_kind,
            item_id,
            location_id,
            qty,
            actor.user_id,
            Utc::now(),
            Some(notes.clone()),
        );

        let mut written = self.ledger.append_entries(vec![entry]).await?;
        let entry = written
            .pop()
            .ok_or_else(|| AppError::Internal("adjustment was not written".to_string()))?;

        tracing::info!(
            "Adjustment {} committed: {} #{} at location {} qty {}",
            entry.id,
            item_kind,
            item_id,
            location_id,
            entry.quantity
        );

        let delta = entry.quantity.normalize();
        let sign = if delta > Decimal::ZERO { "+" } else { "" };
        self.audit.record(AuditRecord::created(
            actor.user_id,
            AuditEntityKind::InventoryAdjustment,
            entry.id,
            format!(
                "Manual inventory adjustment: {} #{} qty {}{}",
                item_kind, item_id, sign, delta
            ),
            serde_json::json!({
                "itemKind": item_kind,
                "itemId": item_id,
                "locationId": location_id,
                "qty": entry.quantity,
                "notes": notes,
            }),
        ));

        Ok(entry)
    }
}
