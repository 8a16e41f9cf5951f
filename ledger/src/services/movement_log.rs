//! Append-only movement log
//!
//! Every stock-affecting event lands here exactly once, written by the
//! ledger engine inside the same transaction as the stock record change.
//! Rows are never updated or deleted; corrections are new compensating
//! movements. This module also serves the read-only projections and
//! aggregations used by movement history and reporting views.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use shared::{LocationKind, Movement, MovementType, StockCoordinate};

use crate::error::{LedgerError, LedgerResult};

const MOVEMENT_COLUMNS: &str = "id, company_id, inventory_item_id, movement_type, quantity, \
     unit_cost, total_cost, from_location_id, from_location_kind, \
     to_location_id, to_location_kind, reason, notes, work_order_id, \
     request_id, created_by, approved_by, created_at";

/// A movement about to be appended. `created_at` is assigned by the
/// database on insert.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub company_id: Uuid,
    pub inventory_item_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub from_location_id: Option<Uuid>,
    pub from_location_kind: Option<LocationKind>,
    pub to_location_id: Option<Uuid>,
    pub to_location_kind: Option<LocationKind>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub work_order_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
}

impl NewMovement {
    /// Per-type required fields: IN needs a destination, OUT needs a
    /// source, TRANSFER needs both and they must differ, ADJUSTMENT needs
    /// exactly one side. Quantity is always the positive magnitude.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(LedgerError::validation(
                "quantity",
                "Movement quantity must be positive",
            ));
        }

        let from = match (self.from_location_id, self.from_location_kind) {
            (Some(id), Some(kind)) => Some((id, kind)),
            (None, None) => None,
            _ => {
                return Err(LedgerError::validation(
                    "from_location",
                    "Source location id and kind must be provided together",
                ))
            }
        };
        let to = match (self.to_location_id, self.to_location_kind) {
            (Some(id), Some(kind)) => Some((id, kind)),
            (None, None) => None,
            _ => {
                return Err(LedgerError::validation(
                    "to_location",
                    "Destination location id and kind must be provided together",
                ))
            }
        };

        match self.movement_type {
            MovementType::In => {
                if to.is_none() {
                    return Err(LedgerError::validation(
                        "to_location",
                        "IN movements require a destination location",
                    ));
                }
            }
            MovementType::Out => {
                if from.is_none() {
                    return Err(LedgerError::validation(
                        "from_location",
                        "OUT movements require a source location",
                    ));
                }
            }
            MovementType::Transfer => match (from, to) {
                (Some(from), Some(to)) => {
                    if from == to {
                        return Err(LedgerError::validation(
                            "to_location",
                            "Transfer source and destination must differ",
                        ));
                    }
                }
                _ => {
                    return Err(LedgerError::validation(
                        "from_location",
                        "TRANSFER movements require both source and destination locations",
                    ))
                }
            },
            MovementType::Adjustment => {
                if from.is_none() == to.is_none() {
                    return Err(LedgerError::validation(
                        "from_location",
                        "ADJUSTMENT movements carry exactly one location side",
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Append one movement. Only the ledger engine calls this, inside the same
/// transaction as the stock record change it describes.
pub(crate) async fn append<'e>(
    executor: impl PgExecutor<'e>,
    movement: &NewMovement,
) -> LedgerResult<Movement> {
    movement.validate()?;

    let appended = sqlx::query_as::<_, Movement>(&format!(
        "INSERT INTO stock_movements \
             (company_id, inventory_item_id, movement_type, quantity, unit_cost, total_cost, \
              from_location_id, from_location_kind, to_location_id, to_location_kind, \
              reason, notes, work_order_id, request_id, created_by, approved_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         RETURNING {MOVEMENT_COLUMNS}"
    ))
    .bind(movement.company_id)
    .bind(movement.inventory_item_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.unit_cost)
    .bind(movement.total_cost)
    .bind(movement.from_location_id)
    .bind(movement.from_location_kind)
    .bind(movement.to_location_id)
    .bind(movement.to_location_kind)
    .bind(&movement.reason)
    .bind(&movement.notes)
    .bind(movement.work_order_id)
    .bind(movement.request_id)
    .bind(movement.created_by)
    .bind(movement.approved_by)
    .fetch_one(executor)
    .await?;

    Ok(appended)
}

/// Movement counts per type
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MovementTypeCount {
    pub movement_type: MovementType,
    pub count: i64,
}

/// Summed movement value for IN vs OUT movements. Transfers and
/// adjustments carry no net company-level value change and are excluded.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MovementValueTotals {
    pub total_in: Decimal,
    pub total_out: Decimal,
}

/// Read-only projections over the movement log
#[derive(Clone)]
pub struct MovementLog {
    db: PgPool,
}

impl MovementLog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Movement history for one item, newest first
    pub async fn list_by_item(
        &self,
        company_id: Uuid,
        inventory_item_id: Uuid,
    ) -> LedgerResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE company_id = $1 AND inventory_item_id = $2 \
             ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .bind(inventory_item_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Movements touching a location on either side, newest first
    pub async fn list_by_location(
        &self,
        company_id: Uuid,
        location_id: Uuid,
        location_kind: LocationKind,
    ) -> LedgerResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE company_id = $1 \
               AND ((from_location_id = $2 AND from_location_kind = $3) \
                 OR (to_location_id = $2 AND to_location_kind = $3)) \
             ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .bind(location_id)
        .bind(location_kind)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Movements in a time window, newest first
    pub async fn list_by_date_range(
        &self,
        company_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LedgerResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE company_id = $1 AND created_at >= $2 AND created_at <= $3 \
             ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// All movements for a company, optionally bounded, newest first
    pub async fn list_by_company(
        &self,
        company_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> LedgerResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE company_id = $1 \
               AND ($2::timestamptz IS NULL OR created_at >= $2) \
               AND ($3::timestamptz IS NULL OR created_at <= $3) \
             ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Movement counts per type for reporting dashboards
    pub async fn totals_by_type(
        &self,
        company_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> LedgerResult<Vec<MovementTypeCount>> {
        let totals = sqlx::query_as::<_, MovementTypeCount>(
            "SELECT movement_type, COUNT(*) AS count FROM stock_movements \
             WHERE company_id = $1 \
               AND ($2::timestamptz IS NULL OR created_at >= $2) \
               AND ($3::timestamptz IS NULL OR created_at <= $3) \
             GROUP BY movement_type \
             ORDER BY movement_type",
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(totals)
    }

    /// Summed `total_cost` of IN movements (value added) vs OUT movements
    /// (value removed)
    pub async fn total_value(
        &self,
        company_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> LedgerResult<MovementValueTotals> {
        let totals = sqlx::query_as::<_, MovementValueTotals>(
            "SELECT COALESCE(SUM(total_cost) FILTER (WHERE movement_type = 'IN'), 0) AS total_in, \
                    COALESCE(SUM(total_cost) FILTER (WHERE movement_type = 'OUT'), 0) AS total_out \
             FROM stock_movements \
             WHERE company_id = $1 \
               AND ($2::timestamptz IS NULL OR created_at >= $2) \
               AND ($3::timestamptz IS NULL OR created_at <= $3)",
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.db)
        .await?;

        Ok(totals)
    }

    /// Replay a coordinate's movements from zero and return the implied
    /// on-hand quantity. Matches the current stock record unless the log
    /// and the record have diverged, which is what reconciliation reports
    /// look for.
    pub async fn reconcile_on_hand(
        &self,
        company_id: Uuid,
        coordinate: &StockCoordinate,
    ) -> LedgerResult<Decimal> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE company_id = $1 AND inventory_item_id = $2 \
               AND ((from_location_id = $3 AND from_location_kind = $4) \
                 OR (to_location_id = $3 AND to_location_kind = $4)) \
             ORDER BY created_at ASC"
        ))
        .bind(company_id)
        .bind(coordinate.inventory_item_id)
        .bind(coordinate.location_id)
        .bind(coordinate.location_kind)
        .fetch_all(&self.db)
        .await?;

        Ok(movements
            .iter()
            .fold(Decimal::ZERO, |acc, m| acc + m.signed_effect(coordinate)))
    }
}
