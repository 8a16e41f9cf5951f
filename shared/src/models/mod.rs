//! Domain models for the stock ledger

mod movement;
mod stock;

pub use movement::*;
pub use stock::*;
