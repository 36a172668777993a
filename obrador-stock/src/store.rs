use std::future::Future;

use obrador_core::{Product, ProductId};

use crate::error::StockError;
use crate::record::{StockKey, WeeklyStockRecord};

/// How an out-of-range `max_stock` edit is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxStockMode {
    /// Reject a ceiling below `sold + reserved` (admin direct edit).
    Reject,
    /// Raise the ceiling to `sold + reserved` if needed (resync pass).
    Clamp,
}

/// Backend contract for the weekly stock table.
///
/// Implementations must apply each mutation as a single atomic unit per key:
/// two concurrent `try_reserve` calls racing for the last unit must be
/// serialized so at most one succeeds, with no transient overshoot visible to
/// other readers. Operations on different keys are independent.
///
/// Uses RPITIT (return-position `impl Trait` in traits) — no `async-trait`
/// needed.
pub trait StockStore: Send + Sync {
    /// Reads a row without creating it.
    fn fetch(
        &self,
        key: &StockKey,
    ) -> impl Future<Output = Result<Option<WeeklyStockRecord>, StockError>> + Send;

    /// Insert-if-absent, seeded from `allotment`. Returns the row either way.
    fn materialize(
        &self,
        key: &StockKey,
        allotment: i64,
    ) -> impl Future<Output = Result<WeeklyStockRecord, StockError>> + Send;

    /// Conditionally increments `reserved_stock` by `quantity`.
    ///
    /// Succeeds iff `reserved_stock + quantity <= current_stock` evaluated
    /// inside the same atomic step as the increment. `Ok(false)` means the
    /// caller lost the race or the week is short; counters are untouched.
    fn try_reserve(
        &self,
        key: &StockKey,
        quantity: i64,
    ) -> impl Future<Output = Result<bool, StockError>> + Send;

    /// Decrements `reserved_stock` by `quantity`, clamped at zero.
    fn release(
        &self,
        key: &StockKey,
        quantity: i64,
    ) -> impl Future<Output = Result<WeeklyStockRecord, StockError>> + Send;

    /// Atomically decrements both `current_stock` and `reserved_stock` by
    /// `quantity` (clamped at zero) — converts a hold into a permanent
    /// depletion. The idempotence guard against duplicate settlement lives in
    /// the checkout orchestrator, not here.
    fn confirm(
        &self,
        key: &StockKey,
        quantity: i64,
    ) -> impl Future<Output = Result<WeeklyStockRecord, StockError>> + Send;

    /// Re-seats the week's ceiling, preserving sold and reserved counts and
    /// letting only the free pool grow or shrink.
    fn apply_max_stock(
        &self,
        key: &StockKey,
        new_max: i64,
        mode: MaxStockMode,
    ) -> impl Future<Output = Result<WeeklyStockRecord, StockError>> + Send;
}

/// Read-only view of the external product catalog.
pub trait ProductCatalog: Send + Sync {
    fn product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, StockError>> + Send;

    /// Active products whose stock policy is `WEEKLY`; drives the resync
    /// pass.
    fn active_weekly_products(
        &self,
    ) -> impl Future<Output = Result<Vec<Product>, StockError>> + Send;
}
