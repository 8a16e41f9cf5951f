//! Movement model and taxonomy
//!
//! A movement is an immutable fact describing one stock-affecting event.
//! Corrections are new compensating movements; rows are never updated or
//! deleted. Location coordinates are denormalized so the log stays valid
//! even if a stock record is later reset by a count.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{LocationKind, StockCoordinate};

/// Movement types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    In,
    Out,
    Transfer,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Transfer => "TRANSFER",
            MovementType::Adjustment => "ADJUSTMENT",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            MovementType::In => "Stock in",
            MovementType::Out => "Stock out",
            MovementType::Transfer => "Transfer",
            MovementType::Adjustment => "Adjustment",
        }
    }

    /// Icon name used by the movement history views
    pub fn icon(&self) -> &'static str {
        match self {
            MovementType::In => "arrow-down-circle",
            MovementType::Out => "arrow-up-circle",
            MovementType::Transfer => "arrow-left-right",
            MovementType::Adjustment => "sliders",
        }
    }

    /// Badge variant used by the movement history views
    pub fn badge(&self) -> &'static str {
        match self {
            MovementType::In => "success",
            MovementType::Out => "destructive",
            MovementType::Transfer => "secondary",
            MovementType::Adjustment => "warning",
        }
    }
}

/// An immutable record of one stock-affecting event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Movement {
    pub id: Uuid,
    pub company_id: Uuid,
    pub inventory_item_id: Uuid,
    pub movement_type: MovementType,
    /// Magnitude of the event, always positive; direction is carried by the
    /// type and the location fields
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub from_location_id: Option<Uuid>,
    pub from_location_kind: Option<LocationKind>,
    pub to_location_id: Option<Uuid>,
    pub to_location_kind: Option<LocationKind>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    /// Opaque linkage to a work order in the caller's domain
    pub work_order_id: Option<Uuid>,
    /// Opaque linkage to a transfer request in the caller's domain
    pub request_id: Option<Uuid>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    pub fn from_coordinate(&self) -> Option<StockCoordinate> {
        match (self.from_location_id, self.from_location_kind) {
            (Some(location_id), Some(kind)) => Some(StockCoordinate::new(
                self.inventory_item_id,
                location_id,
                kind,
            )),
            _ => None,
        }
    }

    pub fn to_coordinate(&self) -> Option<StockCoordinate> {
        match (self.to_location_id, self.to_location_kind) {
            (Some(location_id), Some(kind)) => Some(StockCoordinate::new(
                self.inventory_item_id,
                location_id,
                kind,
            )),
            _ => None,
        }
    }

    /// Short source/destination description for movement history rows,
    /// e.g. "Warehouse → Site" for a transfer
    pub fn location_description(&self) -> String {
        let from = self.from_location_kind.map(|k| k.label());
        let to = self.to_location_kind.map(|k| k.label());
        match (from, to) {
            (Some(from), Some(to)) => format!("{} → {}", from, to),
            (Some(from), None) => format!("{} →", from),
            (None, Some(to)) => format!("→ {}", to),
            (None, None) => "—".to_string(),
        }
    }

    /// Effect of this movement on the on-hand quantity at `coordinate`:
    /// positive when the coordinate is the destination, negative when it is
    /// the source, zero otherwise. Replaying all of a coordinate's
    /// movements from zero reproduces its current on-hand quantity.
    pub fn signed_effect(&self, coordinate: &StockCoordinate) -> Decimal {
        if self.inventory_item_id != coordinate.inventory_item_id {
            return Decimal::ZERO;
        }
        let mut effect = Decimal::ZERO;
        if self.to_coordinate().as_ref() == Some(coordinate) {
            effect += self.quantity;
        }
        if self.from_coordinate().as_ref() == Some(coordinate) {
            effect -= self.quantity;
        }
        effect
    }
}
