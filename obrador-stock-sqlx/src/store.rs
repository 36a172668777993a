use obrador_stock::{MaxStockMode, StockError, StockKey, StockStore, WeeklyStockRecord};
use sqlx::SqlitePool;

use crate::error::SqlxStockErrorExt;

/// [`StockStore`] over an `sqlx::SqlitePool`.
///
/// Every mutation is a single SQL statement, so per-key atomicity comes from
/// the database rather than an application lock or a multi-statement
/// transaction.
#[derive(Clone)]
pub struct SqliteStockStore {
    pool: SqlitePool,
}

impl SqliteStockStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the underlying pool reference.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn record(row: (i64, i64, i64)) -> WeeklyStockRecord {
    WeeklyStockRecord {
        max_stock: row.0,
        current_stock: row.1,
        reserved_stock: row.2,
    }
}

impl StockStore for SqliteStockStore {
    async fn fetch(&self, key: &StockKey) -> Result<Option<WeeklyStockRecord>, StockError> {
        let row: Option<(i64, i64, i64)> = sqlx::query_as(
            "SELECT max_stock, current_stock, reserved_stock \
             FROM weekly_stock WHERE product_id = ? AND week_id = ?",
        )
        .bind(key.product_id.0)
        .bind(key.week_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_stock_error())?;
        Ok(row.map(record))
    }

    async fn materialize(
        &self,
        key: &StockKey,
        allotment: i64,
    ) -> Result<WeeklyStockRecord, StockError> {
        let seed = WeeklyStockRecord::seeded(allotment);
        sqlx::query(
            "INSERT INTO weekly_stock \
             (product_id, week_id, max_stock, current_stock, reserved_stock) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (product_id, week_id) DO NOTHING",
        )
        .bind(key.product_id.0)
        .bind(key.week_id.to_string())
        .bind(seed.max_stock)
        .bind(seed.current_stock)
        .bind(seed.reserved_stock)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_stock_error())?;
        self.fetch(key)
            .await?
            .ok_or_else(|| StockError::not_found(format!("stock row {key}")))
    }

    async fn try_reserve(&self, key: &StockKey, quantity: i64) -> Result<bool, StockError> {
        // The availability check and the increment are one statement; the
        // database serializes them per row, so racing reservations cannot
        // both pass a stale check.
        let result = sqlx::query(
            "UPDATE weekly_stock \
             SET reserved_stock = reserved_stock + ? \
             WHERE product_id = ? AND week_id = ? \
               AND reserved_stock + ? <= current_stock",
        )
        .bind(quantity)
        .bind(key.product_id.0)
        .bind(key.week_id.to_string())
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| e.into_stock_error())?;
        if result.rows_affected() == 1 {
            return Ok(true);
        }
        // No row touched: either the week is short or the row is missing.
        match self.fetch(key).await? {
            Some(_) => Ok(false),
            None => Err(StockError::not_found(format!("stock row {key}"))),
        }
    }

    async fn release(&self, key: &StockKey, quantity: i64) -> Result<WeeklyStockRecord, StockError> {
        let row: Option<(i64, i64, i64)> = sqlx::query_as(
            "UPDATE weekly_stock \
             SET reserved_stock = MAX(0, reserved_stock - ?) \
             WHERE product_id = ? AND week_id = ? \
             RETURNING max_stock, current_stock, reserved_stock",
        )
        .bind(quantity)
        .bind(key.product_id.0)
        .bind(key.week_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_stock_error())?;
        row.map(record)
            .ok_or_else(|| StockError::not_found(format!("stock row {key}")))
    }

    async fn confirm(&self, key: &StockKey, quantity: i64) -> Result<WeeklyStockRecord, StockError> {
        let row: Option<(i64, i64, i64)> = sqlx::query_as(
            "UPDATE weekly_stock \
             SET current_stock = MAX(0, current_stock - ?), \
                 reserved_stock = MAX(0, reserved_stock - ?) \
             WHERE product_id = ? AND week_id = ? \
             RETURNING max_stock, current_stock, reserved_stock",
        )
        .bind(quantity)
        .bind(quantity)
        .bind(key.product_id.0)
        .bind(key.week_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.into_stock_error())?;
        let row = row
            .map(record)
            .ok_or_else(|| StockError::not_found(format!("stock row {key}")))?;
        if !row.invariant_holds() {
            tracing::warn!(key = %key, ?row, "confirm left an inconsistent row");
        }
        Ok(row)
    }

    async fn apply_max_stock(
        &self,
        key: &StockKey,
        new_max: i64,
        mode: MaxStockMode,
    ) -> Result<WeeklyStockRecord, StockError> {
        // One statement per mode, like try_reserve: SET expressions see the
        // pre-update counters, so sold (`max - current`) is carried over and
        // a concurrent writer can never be observed half-applied. The
        // obligation floor is `sold + reserved`.
        let row: Option<(i64, i64, i64)> = match mode {
            MaxStockMode::Reject => sqlx::query_as(
                "UPDATE weekly_stock \
                 SET current_stock = ? - (max_stock - current_stock), \
                     max_stock = ? \
                 WHERE product_id = ? AND week_id = ? \
                   AND (max_stock - current_stock) + reserved_stock <= ? \
                 RETURNING max_stock, current_stock, reserved_stock",
            )
            .bind(new_max)
            .bind(new_max)
            .bind(key.product_id.0)
            .bind(key.week_id.to_string())
            .bind(new_max)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_stock_error())?,
            MaxStockMode::Clamp => sqlx::query_as(
                "UPDATE weekly_stock \
                 SET current_stock = \
                       MAX(?, (max_stock - current_stock) + reserved_stock) \
                       - (max_stock - current_stock), \
                     max_stock = \
                       MAX(?, (max_stock - current_stock) + reserved_stock) \
                 WHERE product_id = ? AND week_id = ? \
                 RETURNING max_stock, current_stock, reserved_stock",
            )
            .bind(new_max)
            .bind(new_max)
            .bind(key.product_id.0)
            .bind(key.week_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.into_stock_error())?,
        };
        if let Some(row) = row.map(record) {
            if row.max_stock != new_max {
                tracing::warn!(
                    key = %key,
                    requested = new_max,
                    effective = row.max_stock,
                    "max_stock below committed obligations; clamped to the floor"
                );
            }
            return Ok(row);
        }
        // Reject mode leaves the row untouched both when it is missing and
        // when the ceiling is below the floor; fetch to tell them apart.
        match self.fetch(key).await? {
            Some(existing) => Err(StockError::Capacity {
                requested: new_max,
                required: existing.sold() + existing.reserved_stock,
            }),
            None => Err(StockError::not_found(format!("stock row {key}"))),
        }
    }
}
