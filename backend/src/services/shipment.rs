//! Shipment workflow: finished products out to customers

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::ledger::shipment_entry;
use shared::{
    AuditAction, AuditEntityKind, AuditRecord, Location, NewShipment, NewShipmentLine, Posted,
    Product, Shipment,
};
use validator::Validate;

use super::{required, required_quantity};
use crate::audit::AuditSink;
use crate::error::{AppError, AppResult};
use crate::store::{CatalogRepository, LedgerRepository};
use crate::AppState;

/// Shipment service
#[derive(Clone)]
pub struct ShipmentService {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn LedgerRepository>,
    audit: AuditSink,
}

/// Input for creating a shipment
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Customer name is required"))]
    pub customer_name: String,
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lines: Vec<ShipmentLineInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentLineInput {
    pub product_id: Option<i64>,
    pub qty: Option<Decimal>,
    pub location_id: Option<i64>,
}

impl ShipmentService {
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

    /// Record a shipment: header, lines and one PRODUCT_OUT row per line.
    /// Lines keep the quantity as entered; the ledger row carries its negation.
    pub async fn create_shipment(
        &self,
        user_id: i64,
        input: CreateShipmentInput,
    ) -> AppResult<Posted<Shipment>> {
        input.validate()?;
        let shipped_at = required("shippedAt", input.shipped_at)?;
        if input.lines.is_empty() {
            return Err(AppError::validation(
                "lines",
                "At least one line item is required",
            ));
        }

        let mut products: HashMap<i64, Product> = HashMap::new();
        let mut locations: HashMap<i64, Location> = HashMap::new();
        let mut lines = Vec::with_capacity(input.lines.len());

        for (i, line) in input.lines.iter().enumerate() {
            let product_id = required(format!("lines[{}].productId", i), line.product_id)?;
            let qty = required_quantity(format!("lines[{}].qty", i), line.qty)?;
            let location_id = required(format!("lines[{}].locationId", i), line.location_id)?;

            if !products.contains_key(&product_id) {
                let product = self
                    .catalog
                    .find_product(product_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Product", product_id))?;
                products.insert(product_id, product);
            }
            if !locations.contains_key(&location_id) {
                let location = self.catalog.resolve_location(location_id).await?;
                locations.insert(location_id, location);
            }

            lines.push(NewShipmentLine {
                product_id,
                qty,
                location_id,
            });
        }

        let entries = lines
            .iter()
            .map(|line| shipment_entry(line, user_id, shipped_at))
            .collect();
        let header = NewShipment {
            customer_name: input.customer_name,
            user_id,
            shipped_at,
        };

        let (shipment, ledger_entries) =
            self.ledger.insert_shipment(header, lines, entries).await?;

        tracing::info!(
            "Shipment {} committed with {} ledger entries",
            shipment.id,
            ledger_entries.len()
        );

        self.audit.record(AuditRecord::created(
            user_id,
            AuditEntityKind::Shipment,
            shipment.id,
            format!(
                "Created shipment for {} with {} line(s)",
                shipment.customer_name,
                shipment.lines.len()
            ),
            serde_json::json!({
                "customerName": shipment.customer_name,
                "lineCount": shipment.lines.len(),
            }),
        ));

        Ok(Posted {
            record: attach(shipment, &products, &locations),
            ledger_entries,
        })
    }

    pub async fn list_shipments(&self) -> AppResult<Vec<Shipment>> {
        self.ledger.list_shipments().await
    }

    /// A shipment with its lines joined to product and location
    pub async fn get_shipment(&self, id: i64) -> AppResult<Shipment> {
        let shipment = self
            .ledger
            .find_shipment(id)
            .await?
            .ok_or_else(|| AppError::not_found("Shipment", id))?;

        let mut products = HashMap::new();
        let mut locations = HashMap::new();
        for line in &shipment.lines {
            if !products.contains_key(&line.product_id) {
                if let Some(p) = self.catalog.find_product(line.product_id).await? {
                    products.insert(p.id, p);
                }
            }
            if !locations.contains_key(&line.location_id) {
                if let Some(l) = self.catalog.find_location(line.location_id).await? {
                    locations.insert(l.id, l);
                }
            }
        }

        Ok(attach(shipment, &products, &locations))
    }

    /// Delete a shipment header and its lines. Ledger rows are kept.
    pub async fn delete_shipment(&self, user_id: i64, id: i64) -> AppResult<()> {
        if !self.ledger.delete_shipment(id).await? {
            return Err(AppError::not_found("Shipment", id));
        }

        tracing::info!("Shipment {} deleted, ledger entries preserved", id);

        self.audit.record(AuditRecord {
            actor_id: user_id,
            action: AuditAction::Delete,
            entity_kind: AuditEntityKind::Shipment,
            entity_id: Some(id),
            description: format!("Deleted shipment #{} (inventory transactions preserved)", id),
            metadata: serde_json::json!({}),
        });

        Ok(())
    }
}

fn attach(
    mut shipment: Shipment,
    products: &HashMap<i64, Product>,
    locations: &HashMap<i64, Location>,
) -> Shipment {
    for line in &mut shipment.lines {
        line.product = products.get(&line.product_id).cloned();
        line.location = locations.get(&line.location_id).cloned();
    }
    shipment
}
