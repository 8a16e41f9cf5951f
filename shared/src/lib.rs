//! Shared types and models for the maintenance management platform's
//! stock ledger.
//!
//! This crate contains the plain-data types exchanged between the ledger
//! service and its collaborators (adjustment endpoints, work-order material
//! consumption, transfer approval workflows, reporting).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
