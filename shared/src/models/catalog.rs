//! Reference catalog records: materials, products, locations and BOM lines

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ItemKind;

/// Raw material consumed by production
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub uom: String,
    /// Total stock across all locations below which the material is reported as low
    pub min_stock: Decimal,
    pub active: bool,
}

/// Finished product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub uom: String,
    pub active: bool,
}

/// Storage location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
}

/// One bill-of-materials line: producing one unit of `product_id`
/// consumes `qty_per_unit` of `material_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomLine {
    pub id: i64,
    pub product_id: i64,
    pub material_id: i64,
    pub qty_per_unit: Decimal,
}

/// Either kind of stocked item
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Material(Material),
    Product(Product),
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Material(_) => ItemKind::Material,
            Item::Product(_) => ItemKind::Product,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Item::Material(m) => m.id,
            Item::Product(p) => p.id,
        }
    }

    pub fn summary(&self) -> ItemSummary {
        match self {
            Item::Material(m) => ItemSummary {
                sku: m.sku.clone(),
                name: m.name.clone(),
                uom: m.uom.clone(),
            },
            Item::Product(p) => ItemSummary {
                sku: p.sku.clone(),
                name: p.name.clone(),
                uom: p.uom.clone(),
            },
        }
    }
}

/// Descriptive fields joined onto stock rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub sku: String,
    pub name: String,
    pub uom: String,
}

/// Descriptive fields of a location joined onto stock rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub code: String,
    pub description: Option<String>,
}

impl From<&Location> for LocationSummary {
    fn from(location: &Location) -> Self {
        Self {
            code: location.code.clone(),
            description: location.description.clone(),
        }
    }
}
