//! The five public ledger operations plus the admin max-stock edit.
//!
//! All week-partitioned state flows through [`StockLedger`]; no other
//! component writes the stock counters. Products with `UNLIMITED` policy
//! short-circuit here and never materialize a row.

use obrador_core::{ProductId, StockPolicy, WeekId};
use serde::{Deserialize, Serialize};

use crate::error::StockError;
use crate::record::{StockKey, WeeklyStockRecord};
use crate::store::{MaxStockMode, ProductCatalog, StockStore};

/// Result of an availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
    /// Units currently sellable; `None` for unlimited-stock products.
    pub current_available: Option<i64>,
}

/// Outcome of a resync pass, for the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncSummary {
    pub week_id: WeekId,
    /// Existing rows re-seated against their product's current allotment.
    pub updated: u64,
    /// Rows created fresh for products without one.
    pub created: u64,
}

/// The only authority over `current_stock` / `reserved_stock`.
///
/// Generic over the store and catalog backends; safe under concurrent
/// invocation for the same key as long as the backends honor the
/// [`StockStore`] atomicity contract.
#[derive(Clone)]
pub struct StockLedger<S, C> {
    store: S,
    catalog: C,
}

impl<S: StockStore, C: ProductCatalog> StockLedger<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Whether `quantity` units are sellable for `(product, week)`.
    ///
    /// Lazily materializes the week's row; otherwise read-only.
    pub async fn check_availability(
        &self,
        product_id: ProductId,
        quantity: i64,
        week_id: WeekId,
    ) -> Result<Availability, StockError> {
        let product = self.weekly_product(product_id, quantity).await?;
        let Some(product) = product else {
            return Ok(Availability {
                available: true,
                current_available: None,
            });
        };
        let key = StockKey::new(product_id, week_id);
        let row = self.store.materialize(&key, product.weekly_stock).await?;
        Ok(Availability {
            available: row.available() >= quantity,
            current_available: Some(row.available()),
        })
    }

    /// Places a tentative hold on `quantity` units.
    ///
    /// `Ok(false)` means the week is short (or the caller lost the race for
    /// the last units); the counters are untouched in that case.
    pub async fn reserve(
        &self,
        product_id: ProductId,
        quantity: i64,
        week_id: WeekId,
    ) -> Result<bool, StockError> {
        let Some(product) = self.weekly_product(product_id, quantity).await? else {
            return Ok(true);
        };
        let key = StockKey::new(product_id, week_id);
        self.store.materialize(&key, product.weekly_stock).await?;
        let reserved = self.store.try_reserve(&key, quantity).await?;
        tracing::debug!(key = %key, quantity, reserved, "stock reservation attempt");
        Ok(reserved)
    }

    /// Drops a hold after a failed order or payment. Clamped at zero.
    pub async fn release(
        &self,
        product_id: ProductId,
        quantity: i64,
        week_id: WeekId,
    ) -> Result<(), StockError> {
        let Some(product) = self.weekly_product(product_id, quantity).await? else {
            return Ok(());
        };
        let key = StockKey::new(product_id, week_id);
        self.store.materialize(&key, product.weekly_stock).await?;
        let row = self.store.release(&key, quantity).await?;
        tracing::debug!(key = %key, quantity, reserved = row.reserved_stock, "stock released");
        Ok(())
    }

    /// Converts a hold into a permanent depletion after payment settles.
    ///
    /// Invoked once per paid order item. The raw operation is a plain
    /// decrement pair; protection against duplicate settlement callbacks
    /// lives in the checkout orchestrator.
    pub async fn confirm_sale(
        &self,
        product_id: ProductId,
        quantity: i64,
        week_id: WeekId,
    ) -> Result<(), StockError> {
        let Some(product) = self.weekly_product(product_id, quantity).await? else {
            return Ok(());
        };
        let key = StockKey::new(product_id, week_id);
        self.store.materialize(&key, product.weekly_stock).await?;
        let row = self.store.confirm(&key, quantity).await?;
        tracing::debug!(
            key = %key,
            quantity,
            current = row.current_stock,
            reserved = row.reserved_stock,
            "sale confirmed"
        );
        Ok(())
    }

    /// Admin re-seed: aligns every active weekly product's row for `week_id`
    /// with the product's current default allotment.
    ///
    /// Missing rows are created; existing rows are re-seated with sold and
    /// reserved counts preserved (ceilings below the obligation floor are
    /// clamped up rather than corrupting in-flight holds). Running it twice
    /// with no intervening sales is a no-op on `current_stock`.
    pub async fn resync_weekly_stock(&self, week_id: WeekId) -> Result<ResyncSummary, StockError> {
        let mut summary = ResyncSummary {
            week_id,
            updated: 0,
            created: 0,
        };
        for product in self.catalog.active_weekly_products().await? {
            let key = StockKey::new(product.id, week_id);
            match self.store.fetch(&key).await? {
                None => {
                    self.store.materialize(&key, product.weekly_stock).await?;
                    summary.created += 1;
                }
                Some(_) => {
                    self.store
                        .apply_max_stock(&key, product.weekly_stock, MaxStockMode::Clamp)
                        .await?;
                    summary.updated += 1;
                }
            }
        }
        tracing::info!(
            week = %summary.week_id,
            created = summary.created,
            updated = summary.updated,
            "weekly stock resynced"
        );
        Ok(summary)
    }

    /// Admin direct edit of one week's ceiling.
    ///
    /// Rejects a ceiling below `sold + reserved` — already-committed
    /// obligations may never exceed capacity.
    pub async fn set_max_stock(
        &self,
        product_id: ProductId,
        week_id: WeekId,
        new_max: i64,
    ) -> Result<WeeklyStockRecord, StockError> {
        if new_max < 0 {
            return Err(StockError::validation(format!(
                "max_stock must be non-negative, got {new_max}"
            )));
        }
        let product = self
            .catalog
            .product(product_id)
            .await?
            .ok_or_else(|| StockError::not_found(format!("product {product_id}")))?;
        if product.stock_policy == StockPolicy::Unlimited {
            return Err(StockError::validation(format!(
                "product {product_id} has unlimited stock"
            )));
        }
        let key = StockKey::new(product_id, week_id);
        self.store.materialize(&key, product.weekly_stock).await?;
        self.store
            .apply_max_stock(&key, new_max, MaxStockMode::Reject)
            .await
    }

    /// Validates the quantity and resolves the product, returning `None` for
    /// unlimited-stock products (which never touch a ledger row).
    async fn weekly_product(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<obrador_core::Product>, StockError> {
        if quantity <= 0 {
            return Err(StockError::validation(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        let product = self
            .catalog
            .product(product_id)
            .await?
            .ok_or_else(|| StockError::not_found(format!("product {product_id}")))?;
        if product.stock_policy == StockPolicy::Unlimited {
            return Ok(None);
        }
        Ok(Some(product))
    }
}
