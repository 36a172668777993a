use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::CheckoutError;
use crate::order::{Order, OrderId, OrderStatus, PaymentStatus};

/// Durable order storage.
///
/// `transition` is the settlement idempotence primitive: it must compare and
/// set the `(status, payment_status)` pair atomically so that exactly one
/// settlement callback wins.
pub trait OrderRepository: Send + Sync {
    /// Persists a new order. The order must be durable before any stock is
    /// reserved against it.
    fn create(&self, order: Order) -> impl Future<Output = Result<Order, CheckoutError>> + Send;

    fn find(&self, id: OrderId)
        -> impl Future<Output = Result<Option<Order>, CheckoutError>> + Send;

    /// Atomically moves the order from `from` to `to`.
    ///
    /// `Ok(false)` means the order was not in `from` — a concurrent or
    /// duplicate settlement already moved it.
    fn transition(
        &self,
        id: OrderId,
        from: (OrderStatus, PaymentStatus),
        to: (OrderStatus, PaymentStatus),
    ) -> impl Future<Output = Result<bool, CheckoutError>> + Send;
}

/// DashMap-backed [`OrderRepository`]; the entry guard makes `transition` a
/// per-order atomic compare-and-set.
#[derive(Clone, Default)]
pub struct MemoryOrderRepository {
    orders: Arc<DashMap<OrderId, Order>>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Snapshot of every stored order, unordered.
    pub fn all(&self) -> Vec<Order> {
        self.orders.iter().map(|o| o.clone()).collect()
    }
}

impl OrderRepository for MemoryOrderRepository {
    async fn create(&self, order: Order) -> Result<Order, CheckoutError> {
        if self.orders.contains_key(&order.id) {
            return Err(CheckoutError::validation(format!(
                "order {} already exists",
                order.id
            )));
        }
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>, CheckoutError> {
        Ok(self.orders.get(&id).map(|o| o.clone()))
    }

    async fn transition(
        &self,
        id: OrderId,
        from: (OrderStatus, PaymentStatus),
        to: (OrderStatus, PaymentStatus),
    ) -> Result<bool, CheckoutError> {
        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| CheckoutError::not_found(format!("order {id}")))?;
        if order.status_pair() != from {
            return Ok(false);
        }
        order.status = to.0;
        order.payment_status = to.1;
        Ok(true)
    }
}
