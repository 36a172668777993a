//! DDL for the `weekly_stock` table.

/// One row per (product, week); the three counters are the only persisted
/// stock state, everything else is derived.
pub const WEEKLY_STOCK_DDL: &str = "\
CREATE TABLE IF NOT EXISTS weekly_stock (
    product_id     BIGINT  NOT NULL,
    week_id        TEXT    NOT NULL,
    max_stock      BIGINT  NOT NULL,
    current_stock  BIGINT  NOT NULL,
    reserved_stock BIGINT  NOT NULL,
    PRIMARY KEY (product_id, week_id)
)";

/// Applies the schema; safe to run on every startup.
#[cfg(feature = "sqlite")]
pub async fn apply(pool: &sqlx::SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(WEEKLY_STOCK_DDL).execute(pool).await?;
    Ok(())
}
