//! # obrador-stock-sqlx — SQLx backend for the stock ledger
//!
//! Implements [`obrador_stock::StockStore`] over a `weekly_stock` table.
//! The race-sensitive operations are single conditional `UPDATE` statements,
//! so the database's own row-level atomicity serializes the
//! increment-and-check — there is no application-side revert window.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqliteStockStore`] | `StockStore` over an `sqlx::SqlitePool` |
//! | [`SqlxStockErrorExt`] | Extension trait: `sqlx::Error` → `StockError` (`.into_stock_error()`) |
//! | [`schema`] | `weekly_stock` DDL and an idempotent apply helper |
//!
//! # Quick start
//!
//! ```ignore
//! let pool = SqlitePoolOptions::new().connect("sqlite:obrador.db").await?;
//! obrador_stock_sqlx::schema::apply(&pool).await?;
//! let store = SqliteStockStore::new(pool);
//! let ledger = StockLedger::new(store, catalog);
//! ```

pub mod error;
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod store;

pub use error::SqlxStockErrorExt;
#[cfg(feature = "sqlite")]
pub use store::SqliteStockStore;
