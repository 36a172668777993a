//! # obrador-stock — the weekly stock ledger
//!
//! The only authority allowed to mutate per-(product, week) stock counters.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`WeeklyStockRecord`] | The three-counter ledger row (`max` / `current` / `reserved`) |
//! | [`StockStore`] | Abstract record-store backend with conditional atomic updates |
//! | [`ProductCatalog`] | Read-only view of the external product catalog |
//! | [`StockLedger`] | The five public operations plus the admin max-stock edit |
//! | [`MemoryStockStore`] | DashMap-backed store, serialized per key |
//!
//! # Counter arithmetic
//!
//! A row holds `max_stock >= current_stock >= reserved_stock >= 0` at all
//! times. `current_stock` starts at `max_stock` and only drops on a confirmed
//! sale; `reserved_stock` tracks tentative holds. Two quantities are always
//! derived, never stored:
//!
//! - available to sell: `current_stock - reserved_stock`
//! - confirmed sold: `max_stock - current_stock`
//!
//! The race-sensitive steps (`try_reserve`, `confirm`) must be applied by the
//! backend as single atomic units per key; see [`StockStore`] for the exact
//! contract each backend has to honor.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod record;
pub mod store;

pub use error::StockError;
pub use ledger::{Availability, ResyncSummary, StockLedger};
pub use memory::{MemoryCatalog, MemoryStockStore};
pub use record::{StockKey, WeeklyStockRecord};
pub use store::{MaxStockMode, ProductCatalog, StockStore};

pub mod prelude {
    //! Re-exports of the most commonly used ledger types.
    pub use crate::{
        Availability, ProductCatalog, StockError, StockKey, StockLedger, StockStore,
        WeeklyStockRecord,
    };
}
