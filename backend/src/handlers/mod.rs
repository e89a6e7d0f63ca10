//! HTTP request handlers

pub mod health;
pub mod inventory;
pub mod production;
pub mod receipts;
pub mod shipments;

pub use health::*;
pub use inventory::*;
pub use production::*;
pub use receipts::*;
pub use shipments::*;
