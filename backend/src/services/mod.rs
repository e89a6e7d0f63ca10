//! Business logic services for the warehouse inventory ledger
//!
//! Every service works against the repository traits in [`crate::store`]
//! and is built either explicitly with `new` or from the shared [`AppState`].
//!
//! [`AppState`]: crate::AppState

pub mod adjustment;
pub mod ledger;
pub mod production;
pub mod receiving;
pub mod shipment;

pub use adjustment::{AdjustInventoryInput, AdjustmentService};
pub use ledger::{LedgerService, StockQuery};
pub use production::{CreateProductionRunInput, ProductionService};
pub use receiving::{CreateReceiptInput, ReceiptLineInput, ReceivingService};
pub use shipment::{CreateShipmentInput, ShipmentLineInput, ShipmentService};

use shared::{ItemKind, QuantityError};

use crate::error::{AppError, AppResult};

/// Parse a wire item kind, reporting failures against `field`
pub fn parse_item_kind(field: &str, value: &str) -> AppResult<ItemKind> {
    value.parse::<ItemKind>().map_err(|_| {
        AppError::validation(field, format!("{} must be MATERIAL or PRODUCT", field))
    })
}

/// A required request field
fn required<T>(field: impl Into<String>, value: Option<T>) -> AppResult<T> {
    let field = field.into();
    value.ok_or_else(|| AppError::validation(field.clone(), format!("{} is required", field)))
}

/// A required, non-zero quantity normalised to storage precision
fn required_quantity(
    field: impl Into<String>,
    value: Option<rust_decimal::Decimal>,
) -> AppResult<rust_decimal::Decimal> {
    shared::require_quantity(value).map_err(|e: QuantityError| AppError::quantity(field, e))
}
