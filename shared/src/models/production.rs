//! Production runs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Product;

/// Production run header; its consumption fans out straight to the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRun {
    pub id: i64,
    pub product_id: i64,
    pub quantity_produced: Decimal,
    pub location_id: i64,
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub product: Option<Product>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProductionRun {
    pub product_id: i64,
    pub quantity_produced: Decimal,
    pub location_id: i64,
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub notes: Option<String>,
}
