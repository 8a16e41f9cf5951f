//! Business logic services for the stock ledger

pub mod ledger;
pub mod movement_log;
pub mod stock_store;

pub use ledger::StockLedger;
pub use movement_log::MovementLog;
