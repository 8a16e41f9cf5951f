//! Keyed storage of current stock quantities
//!
//! One row per (company, item, location, kind) coordinate. Rows are created
//! lazily at a zero baseline on the first stock event and are never deleted;
//! a record at zero quantity is a valid zero-stock row. All mutations go
//! through the ledger engine, which runs these queries inside a transaction
//! after taking a row lock, so concurrent operations on the same coordinate
//! serialize.

use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use shared::{StockCoordinate, StockRecord};

const STOCK_COLUMNS: &str = "id, company_id, inventory_item_id, location_id, location_kind, \
     location_name, quantity, reserved_quantity, available_quantity, \
     last_count_date, last_count_by, created_at, updated_at";

/// Fetch the record at a coordinate, if it has ever been initialized
pub(crate) async fn get<'e>(
    executor: impl PgExecutor<'e>,
    company_id: Uuid,
    coordinate: &StockCoordinate,
) -> Result<Option<StockRecord>, sqlx::Error> {
    sqlx::query_as::<_, StockRecord>(&format!(
        "SELECT {STOCK_COLUMNS} FROM stock_records \
         WHERE company_id = $1 AND inventory_item_id = $2 \
           AND location_id = $3 AND location_kind = $4"
    ))
    .bind(company_id)
    .bind(coordinate.inventory_item_id)
    .bind(coordinate.location_id)
    .bind(coordinate.location_kind)
    .fetch_optional(executor)
    .await
}

/// Fetch the record at a coordinate and lock its row for the remainder of
/// the transaction (single-writer-per-key discipline)
pub(crate) async fn get_for_update<'e>(
    executor: impl PgExecutor<'e>,
    company_id: Uuid,
    coordinate: &StockCoordinate,
) -> Result<Option<StockRecord>, sqlx::Error> {
    sqlx::query_as::<_, StockRecord>(&format!(
        "SELECT {STOCK_COLUMNS} FROM stock_records \
         WHERE company_id = $1 AND inventory_item_id = $2 \
           AND location_id = $3 AND location_kind = $4 \
         FOR UPDATE"
    ))
    .bind(company_id)
    .bind(coordinate.inventory_item_id)
    .bind(coordinate.location_id)
    .bind(coordinate.location_kind)
    .fetch_optional(executor)
    .await
}

/// Create the record at a zero baseline if the coordinate has never seen a
/// stock event. No-op when the record already exists.
pub(crate) async fn create_if_absent<'e>(
    executor: impl PgExecutor<'e>,
    company_id: Uuid,
    coordinate: &StockCoordinate,
    location_name: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO stock_records \
             (company_id, inventory_item_id, location_id, location_kind, location_name) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (company_id, inventory_item_id, location_id, location_kind) DO NOTHING",
    )
    .bind(company_id)
    .bind(coordinate.inventory_item_id)
    .bind(coordinate.location_id)
    .bind(coordinate.location_kind)
    .bind(location_name)
    .execute(executor)
    .await?;
    Ok(())
}

/// Add deltas to the three quantity fields of an existing record. The
/// guards refuse any update that would drive a field negative; after a
/// validated plan against a locked row, a refused update is an invariant
/// violation, which the engine reports.
pub(crate) async fn apply_delta<'e>(
    executor: impl PgExecutor<'e>,
    company_id: Uuid,
    coordinate: &StockCoordinate,
    quantity_delta: Decimal,
    reserved_delta: Decimal,
    available_delta: Decimal,
) -> Result<Option<StockRecord>, sqlx::Error> {
    sqlx::query_as::<_, StockRecord>(&format!(
        "UPDATE stock_records \
         SET quantity = quantity + $5, \
             reserved_quantity = reserved_quantity + $6, \
             available_quantity = available_quantity + $7, \
             updated_at = NOW() \
         WHERE company_id = $1 AND inventory_item_id = $2 \
           AND location_id = $3 AND location_kind = $4 \
           AND quantity + $5 >= 0 \
           AND reserved_quantity + $6 >= 0 \
           AND available_quantity + $7 >= 0 \
         RETURNING {STOCK_COLUMNS}"
    ))
    .bind(company_id)
    .bind(coordinate.inventory_item_id)
    .bind(coordinate.location_id)
    .bind(coordinate.location_kind)
    .bind(quantity_delta)
    .bind(reserved_delta)
    .bind(available_delta)
    .fetch_optional(executor)
    .await
}

/// Set the on-hand quantity to a counted value, creating the record if
/// absent. Reservations are kept and available is recomputed, clamped at
/// zero when the count falls below the reserved quantity.
pub(crate) async fn upsert_absolute<'e>(
    executor: impl PgExecutor<'e>,
    company_id: Uuid,
    coordinate: &StockCoordinate,
    new_quantity: Decimal,
    counted_by: Uuid,
    location_name: Option<&str>,
) -> Result<StockRecord, sqlx::Error> {
    sqlx::query_as::<_, StockRecord>(&format!(
        "INSERT INTO stock_records \
             (company_id, inventory_item_id, location_id, location_kind, \
              quantity, reserved_quantity, available_quantity, location_name, \
              last_count_date, last_count_by) \
         VALUES ($1, $2, $3, $4, $5, 0, $5, $6, NOW(), $7) \
         ON CONFLICT (company_id, inventory_item_id, location_id, location_kind) DO UPDATE \
         SET quantity = EXCLUDED.quantity, \
             available_quantity = GREATEST(EXCLUDED.quantity - stock_records.reserved_quantity, 0), \
             location_name = COALESCE(EXCLUDED.location_name, stock_records.location_name), \
             last_count_date = NOW(), \
             last_count_by = EXCLUDED.last_count_by, \
             updated_at = NOW() \
         RETURNING {STOCK_COLUMNS}"
    ))
    .bind(company_id)
    .bind(coordinate.inventory_item_id)
    .bind(coordinate.location_id)
    .bind(coordinate.location_kind)
    .bind(new_quantity)
    .bind(location_name)
    .bind(counted_by)
    .fetch_one(executor)
    .await
}

/// All stock records for an item across locations
pub(crate) async fn list_for_item<'e>(
    executor: impl PgExecutor<'e>,
    company_id: Uuid,
    inventory_item_id: Uuid,
) -> Result<Vec<StockRecord>, sqlx::Error> {
    sqlx::query_as::<_, StockRecord>(&format!(
        "SELECT {STOCK_COLUMNS} FROM stock_records \
         WHERE company_id = $1 AND inventory_item_id = $2 \
         ORDER BY location_kind, location_id"
    ))
    .bind(company_id)
    .bind(inventory_item_id)
    .fetch_all(executor)
    .await
}

/// All stock records at a location
pub(crate) async fn list_at_location<'e>(
    executor: impl PgExecutor<'e>,
    company_id: Uuid,
    location_id: Uuid,
    location_kind: shared::LocationKind,
) -> Result<Vec<StockRecord>, sqlx::Error> {
    sqlx::query_as::<_, StockRecord>(&format!(
        "SELECT {STOCK_COLUMNS} FROM stock_records \
         WHERE company_id = $1 AND location_id = $2 AND location_kind = $3 \
         ORDER BY inventory_item_id"
    ))
    .bind(company_id)
    .bind(location_id)
    .bind(location_kind)
    .fetch_all(executor)
    .await
}
