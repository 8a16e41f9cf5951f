//! Common types used across the stock ledger

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of storage locations. Location identifiers are only unique within
/// a kind, so the kind is part of every stock coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "location_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Warehouse,
    Site,
    Vehicle,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Warehouse => "warehouse",
            LocationKind::Site => "site",
            LocationKind::Vehicle => "vehicle",
        }
    }

    /// Human-readable label for UI badges
    pub fn label(&self) -> &'static str {
        match self {
            LocationKind::Warehouse => "Warehouse",
            LocationKind::Site => "Site",
            LocationKind::Vehicle => "Vehicle",
        }
    }
}

/// The triple that uniquely identifies one stock record within a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockCoordinate {
    pub inventory_item_id: Uuid,
    pub location_id: Uuid,
    pub location_kind: LocationKind,
}

impl StockCoordinate {
    pub fn new(inventory_item_id: Uuid, location_id: Uuid, location_kind: LocationKind) -> Self {
        Self {
            inventory_item_id,
            location_id,
            location_kind,
        }
    }
}

impl std::fmt::Display for StockCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "item {} at {} {}",
            self.inventory_item_id,
            self.location_kind.as_str(),
            self.location_id
        )
    }
}
