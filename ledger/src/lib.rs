//! Stock ledger and movement recording for the maintenance management
//! platform.
//!
//! Tracks, per inventory item and per storage location, how many units
//! exist, how many are reserved, and how many are available, and records
//! every change as an immutable movement for audit and reconciliation.
//!
//! The crate is consumed in-process by the surrounding application;
//! authentication, tenant resolution, and request validation happen before
//! a call reaches the ledger.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use config::Config;
pub use error::{LedgerError, LedgerResult};
pub use services::{MovementLog, StockLedger};

/// Initialize tracing for binaries embedding the ledger
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_ledger=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
