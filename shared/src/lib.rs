//! Shared types and models for the warehouse inventory platform
//!
//! This crate holds the domain types used by the backend service and its
//! tests, together with the pure ledger arithmetic: stock aggregation,
//! the sign conventions of each workflow and quantity normalisation.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
