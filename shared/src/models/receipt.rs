//! Supplier receipts

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Location, Material};

/// Receipt header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: i64,
    pub supplier_name: String,
    pub user_id: i64,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
}

/// One received material line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub id: i64,
    pub receipt_id: i64,
    pub material_id: i64,
    pub qty: Decimal,
    pub location_id: i64,
    pub material: Option<Material>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReceipt {
    pub supplier_name: String,
    pub user_id: i64,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReceiptLine {
    pub material_id: i64,
    pub qty: Decimal,
    pub location_id: i64,
}
