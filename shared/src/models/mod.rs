//! Domain models for the warehouse inventory platform

mod audit;
mod catalog;
mod ledger;
mod production;
mod receipt;
mod shipment;
mod user;

pub use audit::*;
pub use catalog::*;
pub use ledger::*;
pub use production::*;
pub use receipt::*;
pub use shipment::*;
pub use user::*;
