//! Customer shipments

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Location, Product};

/// Shipment header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: i64,
    pub customer_name: String,
    pub user_id: i64,
    pub shipped_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<ShipmentLine>,
}

/// One shipped product line; `qty` is kept as entered (normally positive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentLine {
    pub id: i64,
    pub shipment_id: i64,
    pub product_id: i64,
    pub qty: Decimal,
    pub location_id: i64,
    pub product: Option<Product>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewShipment {
    pub customer_name: String,
    pub user_id: i64,
    pub shipped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewShipmentLine {
    pub product_id: i64,
    pub qty: Decimal,
    pub location_id: i64,
}
