//! Receiving workflow: supplier receipts into material stock

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::ledger::receipt_entry;
use shared::{
    AuditAction, AuditEntityKind, AuditRecord, Location, Material, NewReceipt, NewReceiptLine,
    Posted, Receipt,
};
use validator::Validate;

use super::{required, required_quantity};
use crate::audit::AuditSink;
use crate::error::{AppError, AppResult};
use crate::store::{CatalogRepository, LedgerRepository};
use crate::AppState;

/// Receiving service
#[derive(Clone)]
pub struct ReceivingService {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn LedgerRepository>,
    audit: AuditSink,
}

/// Input for creating a receipt
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceiptInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Supplier name is required"))]
    pub supplier_name: String,
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lines: Vec<ReceiptLineInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLineInput {
    pub material_id: Option<i64>,
    pub qty: Option<Decimal>,
    pub location_id: Option<i64>,
}

impl ReceivingService {
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

    /// Record a receipt: header, lines and one MATERIAL_IN row per line,
    /// all in one unit of work. Every line is validated before anything is
    /// written.
    pub async fn create_receipt(
        &self,
        user_id: i64,
        input: CreateReceiptInput,
    ) -> AppResult<Posted<Receipt>> {
        input.validate()?;
        let received_at = required("receivedAt", input.received_at)?;
        if input.lines.is_empty() {
            return Err(AppError::validation(
                "lines",
                "At least one line item is required",
            ));
        }

        let mut materials: HashMap<i64, Material> = HashMap::new();
        let mut locations: HashMap<i64, Location> = HashMap::new();
        let mut lines = Vec::with_capacity(input.lines.len());

        for (i, line) in input.lines.iter().enumerate() {
            let material_id = required(format!("lines[{}].materialId", i), line.material_id)?;
            let qty = required_quantity(format!("lines[{}].qty", i), line.qty)?;
            let location_id = required(format!("lines[{}].locationId", i), line.location_id)?;

            if !materials.contains_key(&material_id) {
                let material = self.catalog.resolve_material(material_id).await?;
                materials.insert(material_id, material);
            }
            if !locations.contains_key(&location_id) {
                let location = self.catalog.resolve_location(location_id).await?;
                locations.insert(location_id, location);
            }

            lines.push(NewReceiptLine {
                material_id,
                qty,
                location_id,
            });
        }

        let entries = lines
            .iter()
            .map(|line| receipt_entry(line, user_id, received_at))
            .collect();
        let header = NewReceipt {
            supplier_name: input.supplier_name,
            user_id,
            received_at,
        };

        let (receipt, ledger_entries) = self.ledger.insert_receipt(header, lines, entries).await?;

        tracing::info!(
            "Receipt {} committed with {} ledger entries",
            receipt.id,
            ledger_entries.len()
        );

        self.audit.record(AuditRecord::created(
            user_id,
            AuditEntityKind::Receipt,
            receipt.id,
            format!(
                "Created receipt from {} with {} line(s)",
                receipt.supplier_name,
                receipt.lines.len()
            ),
            serde_json::json!({
                "supplierName": receipt.supplier_name,
                "lineCount": receipt.lines.len(),
            }),
        ));

        Ok(Posted {
            record: attach(receipt, &materials, &locations),
            ledger_entries,
        })
    }

    pub async fn list_receipts(&self) -> AppResult<Vec<Receipt>> {
        self.ledger.list_receipts().await
    }

    /// A receipt with its lines joined to material and location
    pub async fn get_receipt(&self, id: i64) -> AppResult<Receipt> {
        let receipt = self
            .ledger
            .find_receipt(id)
            .await?
            .ok_or_else(|| AppError::not_found("Receipt", id))?;

        let mut materials = HashMap::new();
        let mut locations = HashMap::new();
        for line in &receipt.lines {
            if !materials.contains_key(&line.material_id) {
                if let Some(m) = self.catalog.find_material(line.material_id).await? {
                    materials.insert(m.id, m);
                }
            }
            if !locations.contains_key(&line.location_id) {
                if let Some(l) = self.catalog.find_location(line.location_id).await? {
                    locations.insert(l.id, l);
                }
            }
        }

        Ok(attach(receipt, &materials, &locations))
    }

    /// Delete a receipt header and its lines. Ledger rows are kept.
    pub async fn delete_receipt(&self, user_id: i64, id: i64) -> AppResult<()> {
        if !self.ledger.delete_receipt(id).await? {
            return Err(AppError::not_found("Receipt", id));
        }

        tracing::info!("Receipt {} deleted, ledger entries preserved", id);

        self.audit.record(AuditRecord {
            actor_id: user_id,
            action: AuditAction::Delete,
            entity_kind: AuditEntityKind::Receipt,
            entity_id: Some(id),
            description: format!("Deleted receipt #{} (inventory transactions preserved)", id),
            metadata: serde_json::json!({}),
        });

        Ok(())
    }
}

fn attach(
    mut receipt: Receipt,
    materials: &HashMap<i64, Material>,
    locations: &HashMap<i64, Location>,
) -> Receipt {
    for line in &mut receipt.lines {
        line.material = materials.get(&line.material_id).cloned();
        line.location = locations.get(&line.location_id).cloned();
    }
    receipt
}
