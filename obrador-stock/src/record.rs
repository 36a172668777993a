use obrador_core::{ProductId, WeekId};
use serde::{Deserialize, Serialize};

use crate::error::StockError;
use crate::store::MaxStockMode;

/// Partition key of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: ProductId,
    pub week_id: WeekId,
}

impl StockKey {
    pub fn new(product_id: ProductId, week_id: WeekId) -> Self {
        Self {
            product_id,
            week_id,
        }
    }
}

impl std::fmt::Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.product_id, self.week_id)
    }
}

/// One week's stock counters for one product.
///
/// Created lazily the first time any operation touches its key, seeded from
/// the product's default weekly allotment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStockRecord {
    /// Admin-settable capacity ceiling for the week.
    pub max_stock: i64,
    /// Starts at `max_stock`; decremented only on a confirmed sale.
    pub current_stock: i64,
    /// Tentative holds awaiting payment settlement.
    pub reserved_stock: i64,
}

impl WeeklyStockRecord {
    /// A fresh row seeded from the product's default allotment.
    pub fn seeded(allotment: i64) -> Self {
        let allotment = allotment.max(0);
        Self {
            max_stock: allotment,
            current_stock: allotment,
            reserved_stock: 0,
        }
    }

    /// Units still sellable: `current_stock - reserved_stock`.
    pub fn available(&self) -> i64 {
        self.current_stock - self.reserved_stock
    }

    /// Units confirmed sold this week: `max_stock - current_stock`.
    ///
    /// Always derived; persisting it separately would let it drift from the
    /// three stored counters.
    pub fn sold(&self) -> i64 {
        self.max_stock - self.current_stock
    }

    /// Applies a new capacity ceiling, preserving `sold()` and
    /// `reserved_stock` exactly; only the free pool grows or shrinks.
    ///
    /// The ceiling cannot drop below `sold + reserved` without breaking the
    /// row invariant. [`MaxStockMode::Reject`] surfaces that as a capacity
    /// error; [`MaxStockMode::Clamp`] raises the ceiling to the floor instead
    /// and reports whether it did.
    pub fn reseat_max(&mut self, new_max: i64, mode: MaxStockMode) -> Result<bool, StockError> {
        let sold = self.sold();
        let floor = sold + self.reserved_stock;
        let effective = match mode {
            MaxStockMode::Reject if new_max < floor => {
                return Err(StockError::Capacity {
                    requested: new_max,
                    required: floor,
                });
            }
            MaxStockMode::Reject => new_max,
            MaxStockMode::Clamp => new_max.max(floor),
        };
        self.max_stock = effective;
        self.current_stock = effective - sold;
        Ok(effective != new_max)
    }

    /// `0 <= reserved <= current <= max`.
    pub fn invariant_holds(&self) -> bool {
        0 <= self.reserved_stock
            && self.reserved_stock <= self.current_stock
            && self.current_stock <= self.max_stock
    }
}
