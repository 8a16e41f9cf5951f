//! Stock record model and quantity transition rules
//!
//! `StockLevels` is the single source of quantity arithmetic: every ledger
//! operation computes its next state through one of the transitions below,
//! so the invariants (`available == quantity - reserved`, all fields
//! non-negative, `reserved <= quantity`) are enforced in one place.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{LocationKind, StockCoordinate};

/// Current quantity state of one inventory item at one storage location
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub inventory_item_id: Uuid,
    pub location_id: Uuid,
    pub location_kind: LocationKind,
    /// Denormalized label for display; the location itself lives in the
    /// caller's domain
    pub location_name: Option<String>,
    /// On-hand quantity, regardless of reservation status
    pub quantity: Decimal,
    /// Units earmarked for a future issuance that have not yet left the
    /// location
    pub reserved_quantity: Decimal,
    /// On-hand minus reserved; eligible for new reservations or issuance
    pub available_quantity: Decimal,
    pub last_count_date: Option<DateTime<Utc>>,
    pub last_count_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    pub fn coordinate(&self) -> StockCoordinate {
        StockCoordinate::new(self.inventory_item_id, self.location_id, self.location_kind)
    }

    pub fn levels(&self) -> StockLevels {
        StockLevels {
            quantity: self.quantity,
            reserved: self.reserved_quantity,
            available: self.available_quantity,
        }
    }
}

/// Failure of a quantity transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockLevelError {
    #[error("only {available} units available, {requested} requested")]
    InsufficientAvailable {
        requested: Decimal,
        available: Decimal,
    },

    #[error("only {reserved} units reserved, {requested} requested")]
    InsufficientReserved {
        requested: Decimal,
        reserved: Decimal,
    },

    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),
}

/// The (on-hand, reserved, available) triple of a stock record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub quantity: Decimal,
    pub reserved: Decimal,
    pub available: Decimal,
}

impl StockLevels {
    pub const ZERO: StockLevels = StockLevels {
        quantity: Decimal::ZERO,
        reserved: Decimal::ZERO,
        available: Decimal::ZERO,
    };

    pub fn new(quantity: Decimal, reserved: Decimal, available: Decimal) -> Self {
        Self {
            quantity,
            reserved,
            available,
        }
    }

    /// Stock arriving at the location: on-hand and available both grow
    pub fn receive(self, quantity: Decimal) -> Result<Self, StockLevelError> {
        if quantity <= Decimal::ZERO {
            return Err(StockLevelError::NonPositiveQuantity(quantity));
        }
        Ok(Self {
            quantity: self.quantity + quantity,
            reserved: self.reserved,
            available: self.available + quantity,
        })
    }

    /// Stock physically leaving the location. Reserved stock cannot be
    /// issued directly; it must be released first.
    pub fn issue(self, quantity: Decimal) -> Result<Self, StockLevelError> {
        if quantity <= Decimal::ZERO {
            return Err(StockLevelError::NonPositiveQuantity(quantity));
        }
        if self.available < quantity {
            return Err(StockLevelError::InsufficientAvailable {
                requested: quantity,
                available: self.available,
            });
        }
        Ok(Self {
            quantity: self.quantity - quantity,
            reserved: self.reserved,
            available: self.available - quantity,
        })
    }

    /// Soft hold against available stock; on-hand is untouched
    pub fn reserve(self, quantity: Decimal) -> Result<Self, StockLevelError> {
        if quantity <= Decimal::ZERO {
            return Err(StockLevelError::NonPositiveQuantity(quantity));
        }
        if self.available < quantity {
            return Err(StockLevelError::InsufficientAvailable {
                requested: quantity,
                available: self.available,
            });
        }
        Ok(Self {
            quantity: self.quantity,
            reserved: self.reserved + quantity,
            available: self.available - quantity,
        })
    }

    /// Clear part of a hold, returning the units to the available pool.
    /// Available is recomputed against on-hand and never exceeds it: on a
    /// record clamped by a count below the reserved quantity, released
    /// units only become available once covered by on-hand stock, so the
    /// record heals as its holds are cleared instead of carrying phantom
    /// availability.
    pub fn release(self, quantity: Decimal) -> Result<Self, StockLevelError> {
        if quantity <= Decimal::ZERO {
            return Err(StockLevelError::NonPositiveQuantity(quantity));
        }
        if self.reserved < quantity {
            return Err(StockLevelError::InsufficientReserved {
                requested: quantity,
                reserved: self.reserved,
            });
        }
        let reserved = self.reserved - quantity;
        let available = (self.quantity - reserved)
            .max(Decimal::ZERO)
            .min(self.available + quantity);
        Ok(Self {
            quantity: self.quantity,
            reserved,
            available,
        })
    }

    /// Physical count: on-hand becomes the counted value, reservations are
    /// kept, and available is clamped at zero when the count falls below
    /// the reserved quantity. Returns the new levels and the signed delta
    /// against the previous on-hand quantity.
    pub fn set_absolute(self, new_quantity: Decimal) -> (Self, Decimal) {
        let available = (new_quantity - self.reserved).max(Decimal::ZERO);
        let next = Self {
            quantity: new_quantity,
            reserved: self.reserved,
            available,
        };
        (next, new_quantity - self.quantity)
    }

    /// Whether the identity `available == quantity - reserved` holds and
    /// all fields are non-negative. A count below the reserved quantity
    /// legitimately breaks the identity until the holds are released.
    pub fn is_consistent(&self) -> bool {
        self.quantity >= Decimal::ZERO
            && self.reserved >= Decimal::ZERO
            && self.available >= Decimal::ZERO
            && self.available == self.quantity - self.reserved
    }

    /// Field-wise deltas from `previous` to `self`, in the order
    /// (quantity, reserved, available)
    pub fn delta_from(&self, previous: &StockLevels) -> (Decimal, Decimal, Decimal) {
        (
            self.quantity - previous.quantity,
            self.reserved - previous.reserved,
            self.available - previous.available,
        )
    }
}
