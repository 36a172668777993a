//! In-memory backends for tests and single-process deployments.
//!
//! `DashMap` serializes access per shard, so holding the entry guard across a
//! read-check-mutate sequence gives the per-key atomicity [`StockStore`]
//! requires without a separate lock table.

use std::sync::Arc;

use dashmap::DashMap;
use obrador_core::{Product, ProductId, StockPolicy};

use crate::error::StockError;
use crate::record::{StockKey, WeeklyStockRecord};
use crate::store::{MaxStockMode, ProductCatalog, StockStore};

/// DashMap-backed [`StockStore`].
#[derive(Clone, Default)]
pub struct MemoryStockStore {
    rows: Arc<DashMap<StockKey, WeeklyStockRecord>>,
}

impl MemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialized rows, across all weeks.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl StockStore for MemoryStockStore {
    async fn fetch(&self, key: &StockKey) -> Result<Option<WeeklyStockRecord>, StockError> {
        Ok(self.rows.get(key).map(|row| *row))
    }

    async fn materialize(
        &self,
        key: &StockKey,
        allotment: i64,
    ) -> Result<WeeklyStockRecord, StockError> {
        Ok(*self
            .rows
            .entry(*key)
            .or_insert_with(|| WeeklyStockRecord::seeded(allotment)))
    }

    async fn try_reserve(&self, key: &StockKey, quantity: i64) -> Result<bool, StockError> {
        let mut row = self
            .rows
            .get_mut(key)
            .ok_or_else(|| StockError::not_found(format!("stock row {key}")))?;
        // Check and increment under the same entry guard: losers of the race
        // leave the counters untouched, with no transient overshoot.
        if row.reserved_stock + quantity <= row.current_stock {
            row.reserved_stock += quantity;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn release(&self, key: &StockKey, quantity: i64) -> Result<WeeklyStockRecord, StockError> {
        let mut row = self
            .rows
            .get_mut(key)
            .ok_or_else(|| StockError::not_found(format!("stock row {key}")))?;
        if row.reserved_stock < quantity {
            tracing::warn!(
                key = %key,
                reserved = row.reserved_stock,
                quantity,
                "release would drop reserved_stock below zero; clamping"
            );
        }
        row.reserved_stock = (row.reserved_stock - quantity).max(0);
        Ok(*row)
    }

    async fn confirm(&self, key: &StockKey, quantity: i64) -> Result<WeeklyStockRecord, StockError> {
        let mut row = self
            .rows
            .get_mut(key)
            .ok_or_else(|| StockError::not_found(format!("stock row {key}")))?;
        if row.current_stock < quantity || row.reserved_stock < quantity {
            tracing::warn!(
                key = %key,
                current = row.current_stock,
                reserved = row.reserved_stock,
                quantity,
                "confirm would drop a counter below zero; clamping"
            );
        }
        row.current_stock = (row.current_stock - quantity).max(0);
        row.reserved_stock = (row.reserved_stock - quantity).max(0);
        Ok(*row)
    }

    async fn apply_max_stock(
        &self,
        key: &StockKey,
        new_max: i64,
        mode: MaxStockMode,
    ) -> Result<WeeklyStockRecord, StockError> {
        let mut row = self
            .rows
            .get_mut(key)
            .ok_or_else(|| StockError::not_found(format!("stock row {key}")))?;
        let clamped = row.reseat_max(new_max, mode)?;
        if clamped {
            tracing::warn!(
                key = %key,
                requested = new_max,
                effective = row.max_stock,
                "max_stock below committed obligations; clamped to the floor"
            );
        }
        Ok(*row)
    }
}

/// DashMap-backed [`ProductCatalog`].
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    products: Arc<DashMap<ProductId, Product>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, product: Product) {
        self.products.insert(product.id, product);
    }

    pub fn remove(&self, id: ProductId) {
        self.products.remove(&id);
    }
}

impl ProductCatalog for MemoryCatalog {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StockError> {
        Ok(self.products.get(&id).map(|p| p.clone()))
    }

    async fn active_weekly_products(&self) -> Result<Vec<Product>, StockError> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| p.active && p.stock_policy == StockPolicy::Weekly)
            .map(|p| p.clone())
            .collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }
}
