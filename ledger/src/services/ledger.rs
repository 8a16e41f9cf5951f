//! Stock ledger engine
//!
//! The only component that mutates stock records, and it always does so
//! together with the movement describing the change. Every operation is one
//! database transaction: lock the coordinate's row, compute the next levels
//! through the pure transitions in `shared`, apply the guarded update, and
//! append the movement, so the record and its audit trail commit together
//! or not at all.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::{
    validate_counted_quantity, validate_positive_quantity, validate_unit_cost, LocationKind,
    Movement, MovementType, StockCoordinate, StockRecord,
};

use crate::error::{LedgerError, LedgerResult};
use crate::services::movement_log::{self, NewMovement};
use crate::services::stock_store;

/// Input for receiving stock into a location
#[derive(Debug, Deserialize)]
pub struct ReceiveStockInput {
    pub inventory_item_id: Uuid,
    pub location_id: Uuid,
    pub location_kind: LocationKind,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub work_order_id: Option<Uuid>,
    pub location_name: Option<String>,
}

/// Input for issuing stock out of a location
#[derive(Debug, Deserialize)]
pub struct IssueStockInput {
    pub inventory_item_id: Uuid,
    pub location_id: Uuid,
    pub location_kind: LocationKind,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub work_order_id: Option<Uuid>,
}

/// Input for moving stock between two locations
#[derive(Debug, Deserialize)]
pub struct TransferStockInput {
    pub inventory_item_id: Uuid,
    pub from_location_id: Uuid,
    pub from_location_kind: LocationKind,
    pub to_location_id: Uuid,
    pub to_location_kind: LocationKind,
    pub quantity: Decimal,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub request_id: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub to_location_name: Option<String>,
}

/// Input for reserving or releasing stock at a location
#[derive(Debug, Deserialize)]
pub struct ReservationInput {
    pub inventory_item_id: Uuid,
    pub location_id: Uuid,
    pub location_kind: LocationKind,
    pub quantity: Decimal,
}

/// Input for a physical count / absolute correction
#[derive(Debug, Deserialize)]
pub struct SetQuantityInput {
    pub inventory_item_id: Uuid,
    pub location_id: Uuid,
    pub location_kind: LocationKind,
    pub new_quantity: Decimal,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub location_name: Option<String>,
}

/// Stock ledger engine
#[derive(Clone)]
pub struct StockLedger {
    db: PgPool,
}

impl StockLedger {
    /// Create a new StockLedger instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record stock arriving at a location, creating the stock record at a
    /// zero baseline if the coordinate has never seen a stock event.
    /// Returns the appended IN movement.
    pub async fn receive_stock(
        &self,
        company_id: Uuid,
        actor: Uuid,
        input: ReceiveStockInput,
    ) -> LedgerResult<Movement> {
        validate_positive_quantity(input.quantity)
            .map_err(|msg| LedgerError::validation("quantity", msg))?;
        if let Some(cost) = input.unit_cost {
            validate_unit_cost(cost).map_err(|msg| LedgerError::validation("unit_cost", msg))?;
        }

        let coordinate = StockCoordinate::new(
            input.inventory_item_id,
            input.location_id,
            input.location_kind,
        );

        let mut tx = self.db.begin().await?;

        stock_store::create_if_absent(
            &mut *tx,
            company_id,
            &coordinate,
            input.location_name.as_deref(),
        )
        .await?;
        let record = stock_store::get_for_update(&mut *tx, company_id, &coordinate)
            .await?
            .ok_or_else(|| {
                LedgerError::invariant(format!("{} vanished after zero-baseline upsert", coordinate))
            })?;

        let next = record.levels().receive(input.quantity)?;
        let (dq, dr, da) = next.delta_from(&record.levels());
        stock_store::apply_delta(&mut *tx, company_id, &coordinate, dq, dr, da)
            .await?
            .ok_or_else(|| {
                LedgerError::invariant(format!("receive of {} refused at {}", input.quantity, coordinate))
            })?;

        let total_cost = input.unit_cost.map(|cost| cost * input.quantity);
        let movement = movement_log::append(
            &mut *tx,
            &NewMovement {
                company_id,
                inventory_item_id: input.inventory_item_id,
                movement_type: MovementType::In,
                quantity: input.quantity,
                unit_cost: input.unit_cost,
                total_cost,
                from_location_id: None,
                from_location_kind: None,
                to_location_id: Some(input.location_id),
                to_location_kind: Some(input.location_kind),
                reason: input.reason,
                notes: input.notes,
                work_order_id: input.work_order_id,
                request_id: None,
                created_by: actor,
                approved_by: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(movement)
    }

    /// Record stock physically leaving a location. Fails with
    /// `InsufficientAvailable` if the available quantity does not cover the
    /// request; reserved stock must be released before it can be issued.
    /// Returns the appended OUT movement.
    pub async fn issue_stock(
        &self,
        company_id: Uuid,
        actor: Uuid,
        input: IssueStockInput,
    ) -> LedgerResult<Movement> {
        validate_positive_quantity(input.quantity)
            .map_err(|msg| LedgerError::validation("quantity", msg))?;
        if let Some(cost) = input.unit_cost {
            validate_unit_cost(cost).map_err(|msg| LedgerError::validation("unit_cost", msg))?;
        }

        let coordinate = StockCoordinate::new(
            input.inventory_item_id,
            input.location_id,
            input.location_kind,
        );

        let mut tx = self.db.begin().await?;

        let record = stock_store::get_for_update(&mut *tx, company_id, &coordinate)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("Stock record for {}", coordinate)))?;

        let next = record.levels().issue(input.quantity)?;
        let (dq, dr, da) = next.delta_from(&record.levels());
        stock_store::apply_delta(&mut *tx, company_id, &coordinate, dq, dr, da)
            .await?
            .ok_or_else(|| {
                LedgerError::invariant(format!("issue of {} refused at {}", input.quantity, coordinate))
            })?;

        let total_cost = input.unit_cost.map(|cost| cost * input.quantity);
        let movement = movement_log::append(
            &mut *tx,
            &NewMovement {
                company_id,
                inventory_item_id: input.inventory_item_id,
                movement_type: MovementType::Out,
                quantity: input.quantity,
                unit_cost: input.unit_cost,
                total_cost,
                from_location_id: Some(input.location_id),
                from_location_kind: Some(input.location_kind),
                to_location_id: None,
                to_location_kind: None,
                reason: input.reason,
                notes: input.notes,
                work_order_id: input.work_order_id,
                request_id: None,
                created_by: actor,
                approved_by: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(movement)
    }

    /// Move stock between two locations as one atomic operation: the source
    /// decrement and destination increment commit together with exactly one
    /// TRANSFER movement carrying both coordinates.
    pub async fn transfer_stock(
        &self,
        company_id: Uuid,
        actor: Uuid,
        input: TransferStockInput,
    ) -> LedgerResult<Movement> {
        if input.quantity <= Decimal::ZERO {
            return Err(LedgerError::InvalidTransfer(
                "Transfer quantity must be positive".to_string(),
            ));
        }

        let from = StockCoordinate::new(
            input.inventory_item_id,
            input.from_location_id,
            input.from_location_kind,
        );
        let to = StockCoordinate::new(
            input.inventory_item_id,
            input.to_location_id,
            input.to_location_kind,
        );
        if from == to {
            return Err(LedgerError::InvalidTransfer(
                "Source and destination locations are identical".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let source = stock_store::get_for_update(&mut *tx, company_id, &from)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("Stock record for {}", from)))?;

        let next_source = source.levels().issue(input.quantity)?;
        let (dq, dr, da) = next_source.delta_from(&source.levels());
        stock_store::apply_delta(&mut *tx, company_id, &from, dq, dr, da)
            .await?
            .ok_or_else(|| {
                LedgerError::invariant(format!("transfer of {} refused at {}", input.quantity, from))
            })?;

        stock_store::create_if_absent(&mut *tx, company_id, &to, input.to_location_name.as_deref())
            .await?;
        let destination = stock_store::get_for_update(&mut *tx, company_id, &to)
            .await?
            .ok_or_else(|| {
                LedgerError::invariant(format!("{} vanished after zero-baseline upsert", to))
            })?;

        let next_destination = destination.levels().receive(input.quantity)?;
        let (dq, dr, da) = next_destination.delta_from(&destination.levels());
        stock_store::apply_delta(&mut *tx, company_id, &to, dq, dr, da)
            .await?
            .ok_or_else(|| {
                LedgerError::invariant(format!("transfer of {} refused at {}", input.quantity, to))
            })?;

        let movement = movement_log::append(
            &mut *tx,
            &NewMovement {
                company_id,
                inventory_item_id: input.inventory_item_id,
                movement_type: MovementType::Transfer,
                quantity: input.quantity,
                unit_cost: None,
                total_cost: None,
                from_location_id: Some(input.from_location_id),
                from_location_kind: Some(input.from_location_kind),
                to_location_id: Some(input.to_location_id),
                to_location_kind: Some(input.to_location_kind),
                reason: input.reason,
                notes: input.notes,
                work_order_id: None,
                request_id: input.request_id,
                created_by: actor,
                approved_by: input.approved_by,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(movement)
    }

    /// Place a soft hold on available stock. No movement is recorded: a
    /// reservation is not a physical event. Fulfilment goes through
    /// `issue_stock` plus `release_reservation`.
    pub async fn reserve(
        &self,
        company_id: Uuid,
        actor: Uuid,
        input: ReservationInput,
    ) -> LedgerResult<StockRecord> {
        validate_positive_quantity(input.quantity)
            .map_err(|msg| LedgerError::validation("quantity", msg))?;

        let coordinate = StockCoordinate::new(
            input.inventory_item_id,
            input.location_id,
            input.location_kind,
        );

        let mut tx = self.db.begin().await?;

        let record = stock_store::get_for_update(&mut *tx, company_id, &coordinate)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("Stock record for {}", coordinate)))?;

        let next = record.levels().reserve(input.quantity)?;
        let (dq, dr, da) = next.delta_from(&record.levels());
        let updated = stock_store::apply_delta(&mut *tx, company_id, &coordinate, dq, dr, da)
            .await?
            .ok_or_else(|| {
                LedgerError::invariant(format!(
                    "reservation of {} refused at {}",
                    input.quantity, coordinate
                ))
            })?;

        tx.commit().await?;
        tracing::debug!(
            actor = %actor,
            coordinate = %coordinate,
            quantity = %input.quantity,
            "stock reserved"
        );
        Ok(updated)
    }

    /// Clear part of a hold, returning the units to the available pool. No
    /// movement is recorded.
    pub async fn release_reservation(
        &self,
        company_id: Uuid,
        actor: Uuid,
        input: ReservationInput,
    ) -> LedgerResult<StockRecord> {
        validate_positive_quantity(input.quantity)
            .map_err(|msg| LedgerError::validation("quantity", msg))?;

        let coordinate = StockCoordinate::new(
            input.inventory_item_id,
            input.location_id,
            input.location_kind,
        );

        let mut tx = self.db.begin().await?;

        let record = stock_store::get_for_update(&mut *tx, company_id, &coordinate)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("Stock record for {}", coordinate)))?;

        let next = record.levels().release(input.quantity)?;
        let (dq, dr, da) = next.delta_from(&record.levels());
        let updated = stock_store::apply_delta(&mut *tx, company_id, &coordinate, dq, dr, da)
            .await?
            .ok_or_else(|| {
                LedgerError::invariant(format!(
                    "release of {} refused at {}",
                    input.quantity, coordinate
                ))
            })?;

        tx.commit().await?;
        tracing::debug!(
            actor = %actor,
            coordinate = %coordinate,
            quantity = %input.quantity,
            "reservation released"
        );
        Ok(updated)
    }

    /// Apply a physical count / absolute correction. Reservations are kept
    /// and available is clamped at zero when the count falls below the
    /// reserved quantity. A count matching the current on-hand quantity
    /// appends no movement; otherwise an ADJUSTMENT movement records the
    /// magnitude of the correction, its direction carried by the location
    /// side.
    pub async fn set_absolute_quantity(
        &self,
        company_id: Uuid,
        actor: Uuid,
        input: SetQuantityInput,
    ) -> LedgerResult<(StockRecord, Option<Movement>)> {
        validate_counted_quantity(input.new_quantity)
            .map_err(|msg| LedgerError::validation("new_quantity", msg))?;

        let coordinate = StockCoordinate::new(
            input.inventory_item_id,
            input.location_id,
            input.location_kind,
        );

        let mut tx = self.db.begin().await?;

        // Zero-baseline upsert first so concurrent first events on the
        // coordinate serialize on the row lock before `previous` is read
        stock_store::create_if_absent(
            &mut *tx,
            company_id,
            &coordinate,
            input.location_name.as_deref(),
        )
        .await?;
        let previous = stock_store::get_for_update(&mut *tx, company_id, &coordinate)
            .await?
            .ok_or_else(|| {
                LedgerError::invariant(format!("{} vanished after zero-baseline upsert", coordinate))
            })?
            .levels();

        let (expected, delta) = previous.set_absolute(input.new_quantity);

        let record = stock_store::upsert_absolute(
            &mut *tx,
            company_id,
            &coordinate,
            input.new_quantity,
            actor,
            input.location_name.as_deref(),
        )
        .await?;

        if record.levels() != expected {
            return Err(LedgerError::invariant(format!(
                "count at {} stored {:?}, expected {:?}",
                coordinate,
                record.levels(),
                expected
            )));
        }

        let movement = if delta != Decimal::ZERO {
            let (from_side, to_side) = if delta > Decimal::ZERO {
                (None, Some((input.location_id, input.location_kind)))
            } else {
                (Some((input.location_id, input.location_kind)), None)
            };
            Some(
                movement_log::append(
                    &mut *tx,
                    &NewMovement {
                        company_id,
                        inventory_item_id: input.inventory_item_id,
                        movement_type: MovementType::Adjustment,
                        quantity: delta.abs(),
                        unit_cost: None,
                        total_cost: None,
                        from_location_id: from_side.map(|(id, _)| id),
                        from_location_kind: from_side.map(|(_, kind)| kind),
                        to_location_id: to_side.map(|(id, _)| id),
                        to_location_kind: to_side.map(|(_, kind)| kind),
                        reason: input.reason,
                        notes: input.notes,
                        work_order_id: None,
                        request_id: None,
                        created_by: actor,
                        approved_by: None,
                    },
                )
                .await?,
            )
        } else {
            None
        };

        tx.commit().await?;
        Ok((record, movement))
    }

    /// Current stock at a coordinate, if it has ever been initialized
    pub async fn get_stock(
        &self,
        company_id: Uuid,
        coordinate: &StockCoordinate,
    ) -> LedgerResult<Option<StockRecord>> {
        Ok(stock_store::get(&self.db, company_id, coordinate).await?)
    }

    /// Stock records for an item across all locations
    pub async fn list_stock_for_item(
        &self,
        company_id: Uuid,
        inventory_item_id: Uuid,
    ) -> LedgerResult<Vec<StockRecord>> {
        Ok(stock_store::list_for_item(&self.db, company_id, inventory_item_id).await?)
    }

    /// Stock records at a location
    pub async fn list_stock_at_location(
        &self,
        company_id: Uuid,
        location_id: Uuid,
        location_kind: LocationKind,
    ) -> LedgerResult<Vec<StockRecord>> {
        Ok(stock_store::list_at_location(&self.db, company_id, location_id, location_kind).await?)
    }
}
