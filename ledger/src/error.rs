//! Error handling for the stock ledger
//!
//! All failures are returned synchronously as typed values so calling code
//! (adjustment endpoints, transfer approval workflows) can map them to
//! user-facing messages. Nothing is retried inside the ledger.

use rust_decimal::Decimal;
use shared::StockLevelError;
use thiserror::Error;

/// Ledger error types
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("insufficient stock: only {available} units available, {requested} requested")]
    InsufficientAvailable {
        requested: Decimal,
        available: Decimal,
    },

    #[error("insufficient reservation: only {reserved} units reserved, {requested} requested")]
    InsufficientReserved {
        requested: Decimal,
        reserved: Decimal,
    },

    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    /// Signals a logic bug, not bad input; logged at error severity at the
    /// raise site
    #[error("stock invariant violated: {0}")]
    InvariantViolation(String),

    #[error("validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl LedgerError {
    /// Construct an `InvariantViolation`, logging it as it is raised
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!("stock invariant violated: {}", message);
        LedgerError::InvariantViolation(message)
    }

    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Stable code for collaborators mapping errors to user-facing messages
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::InsufficientAvailable { .. } => "INSUFFICIENT_AVAILABLE",
            LedgerError::InsufficientReserved { .. } => "INSUFFICIENT_RESERVED",
            LedgerError::InvalidTransfer(_) => "INVALID_TRANSFER",
            LedgerError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            LedgerError::Validation { .. } => "VALIDATION_ERROR",
            LedgerError::Database(_) => "DATABASE_ERROR",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StockLevelError> for LedgerError {
    fn from(err: StockLevelError) -> Self {
        match err {
            StockLevelError::InsufficientAvailable {
                requested,
                available,
            } => LedgerError::InsufficientAvailable {
                requested,
                available,
            },
            StockLevelError::InsufficientReserved {
                requested,
                reserved,
            } => LedgerError::InsufficientReserved {
                requested,
                reserved,
            },
            StockLevelError::NonPositiveQuantity(quantity) => LedgerError::Validation {
                field: "quantity".to_string(),
                message: format!("Quantity must be positive, got {}", quantity),
            },
        }
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
