//! Common types used across the platform

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a wire value does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseKindError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseKindError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Kind of stocked item a ledger row refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Material,
    Product,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Material => "MATERIAL",
            ItemKind::Product => "PRODUCT",
        }
    }
}

impl FromStr for ItemKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MATERIAL" => Ok(ItemKind::Material),
            "PRODUCT" => Ok(ItemKind::Product),
            other => Err(ParseKindError::new("item kind", other)),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger transaction kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnKind {
    MaterialIn,
    MaterialConsume,
    ProductIn,
    ProductOut,
    Adjust,
}

impl TxnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnKind::MaterialIn => "MATERIAL_IN",
            TxnKind::MaterialConsume => "MATERIAL_CONSUME",
            TxnKind::ProductIn => "PRODUCT_IN",
            TxnKind::ProductOut => "PRODUCT_OUT",
            TxnKind::Adjust => "ADJUST",
        }
    }
}

impl FromStr for TxnKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MATERIAL_IN" => Ok(TxnKind::MaterialIn),
            "MATERIAL_CONSUME" => Ok(TxnKind::MaterialConsume),
            "PRODUCT_IN" => Ok(TxnKind::ProductIn),
            "PRODUCT_OUT" => Ok(TxnKind::ProductOut),
            "ADJUST" => Ok(TxnKind::Adjust),
            other => Err(ParseKindError::new("transaction kind", other)),
        }
    }
}

impl fmt::Display for TxnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The business record that caused a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    Receipt,
    Production,
    Shipment,
    Manual,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Receipt => "RECEIPT",
            SourceKind::Production => "PRODUCTION",
            SourceKind::Shipment => "SHIPMENT",
            SourceKind::Manual => "MANUAL",
        }
    }
}

impl FromStr for SourceKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIPT" => Ok(SourceKind::Receipt),
            "PRODUCTION" => Ok(SourceKind::Production),
            "SHIPMENT" => Ok(SourceKind::Shipment),
            "MANUAL" => Ok(SourceKind::Manual),
            other => Err(ParseKindError::new("source kind", other)),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive bounds on business time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Whether `at` falls inside both bounds (missing bounds are open)
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn kinds_round_trip_through_wire_names() {
        for kind in [ItemKind::Material, ItemKind::Product] {
            assert_eq!(kind.as_str().parse::<ItemKind>().unwrap(), kind);
        }
        for kind in [
            TxnKind::MaterialIn,
            TxnKind::MaterialConsume,
            TxnKind::ProductIn,
            TxnKind::ProductOut,
            TxnKind::Adjust,
        ] {
            assert_eq!(kind.as_str().parse::<TxnKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_item_kind_is_rejected() {
        let err = "WIDGET".parse::<ItemKind>().unwrap_err();
        assert_eq!(err.value, "WIDGET");
        assert!("material".parse::<ItemKind>().is_err());
    }

    #[test]
    fn materials_sort_before_products() {
        assert!(ItemKind::Material < ItemKind::Product);
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let range = DateRange::new(Some(start), Some(end));

        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(end + chrono::Duration::seconds(1)));
        assert!(DateRange::default().contains(start));
    }
}
