//! Production workflow: BOM consumption and finished-product output

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::ledger::production_entries;
use shared::{
    AuditAction, AuditEntityKind, AuditRecord, NewProductionRun, Posted, ProductionRun,
};
use validator::Validate;

use super::{required, required_quantity};
use crate::audit::AuditSink;
use crate::error::{AppError, AppResult};
use crate::store::{CatalogRepository, LedgerRepository};
use crate::AppState;

/// Production service
#[derive(Clone)]
pub struct ProductionService {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn LedgerRepository>,
    audit: AuditSink,
}

/// Input for recording a production run
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductionRunInput {
    pub product_id: Option<i64>,
    pub quantity_produced: Option<Decimal>,
    pub location_id: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl ProductionService {
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

    /// Record a production run. One MATERIAL_CONSUME row is written per BOM
    /// line of the product, followed by one PRODUCT_IN row, all stamped at
    /// the completion time. Material stock may go negative.
    pub async fn create_production_run(
        &self,
        user_id: i64,
        input: CreateProductionRunInput,
    ) -> AppResult<Posted<ProductionRun>> {
        input.validate()?;
        let product_id = required("productId", input.product_id)?;
        let quantity_produced = required_quantity("quantityProduced", input.quantity_produced)?;
        let location_id = required("locationId", input.location_id)?;
        let started_at = required("startedAt", input.started_at)?;
        let completed_at = required("completedAt", input.completed_at)?;

        let (product, bom) = self.catalog.resolve_product(product_id).await?;
        self.catalog.resolve_location(location_id).await?;

        let header = NewProductionRun {
            product_id,
            quantity_produced,
            location_id,
            user_id,
            started_at,
            completed_at,
            notes: input.notes.filter(|n| !n.is_empty()),
        };
        let entries = production_entries(&header, &bom)
            .map_err(|e| AppError::quantity("quantityProduced", e))?;

        let (mut run, ledger_entries) = self.ledger.insert_production_run(header, entries).await?;

        tracing::info!(
            "Production run {} committed: {} consumption entries, product {} +{}",
            run.id,
            bom.len(),
            product.id,
            run.quantity_produced
        );

        self.audit.record(AuditRecord::created(
            user_id,
            AuditEntityKind::Production,
            run.id,
            format!(
                "Created production run for {} (qty: {})",
                product.name,
                run.quantity_produced.normalize()
            ),
            serde_json::json!({
                "productId": product.id,
                "quantityProduced": run.quantity_produced,
                "locationId": run.location_id,
            }),
        ));

        run.product = Some(product);
        Ok(Posted {
            record: run,
            ledger_entries,
        })
    }

    /// Production runs, newest start first, each with its product
    pub async fn list_production_runs(&self) -> AppResult<Vec<ProductionRun>> {
        let mut runs = self.ledger.list_production_runs().await?;
        for run in &mut runs {
            run.product = self.catalog.find_product(run.product_id).await?;
        }
        Ok(runs)
    }

    pub async fn get_production_run(&self, id: i64) -> AppResult<ProductionRun> {
        let mut run = self
            .ledger
            .find_production_run(id)
            .await?
            .ok_or_else(|| AppError::not_found("ProductionRun", id))?;
        run.product = self.catalog.find_product(run.product_id).await?;
        Ok(run)
    }

    /// Delete a production run header. Ledger rows are kept.
    pub async fn delete_production_run(&self, user_id: i64, id: i64) -> AppResult<()> {
        if !self.ledger.delete_production_run(id).await? {
            return Err(AppError::not_found("ProductionRun", id));
        }

        tracing::info!("Production run {} deleted, ledger entries preserved", id);

        self.audit.record(AuditRecord {
            actor_id: user_id,
            action: AuditAction::Delete,
            entity_kind: AuditEntityKind::Production,
            entity_id: Some(id),
            description: format!(
                "Deleted production run #{} (inventory transactions preserved)",
                id
            ),
            metadata: serde_json::json!({}),
        });

        Ok(())
    }
}
