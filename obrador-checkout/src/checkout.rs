//! The checkout orchestrator.
//!
//! Sequencing contract (see the crate docs for the idempotence story):
//!
//! 1. Gate — closed window fails fast, nothing reserved.
//! 2. Availability pass — any short line rejects the whole cart, reported
//!    per item.
//! 3. Totals from authoritative catalog prices plus the shipping lookup.
//! 4. Durable order create, then per-item reservation. Steps 2 and 4 are not
//!    atomic together, so 4 re-validates; a line losing the race unwinds the
//!    earlier lines and cancels the order.
//! 5. Payment-session create; failure also unwinds and cancels.
//! 6. Webhook settlement: compare-and-set the order status first, then
//!    confirm or release the ledger.

use chrono::{DateTime, Utc};
use obrador_core::{DeliveryMethod, OrderingGate, ProductId, WeekId};
use obrador_stock::{ProductCatalog, ResyncSummary, StockError, StockLedger, StockStore};
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, ItemShortage};
use crate::order::{Cart, Customer, Order, OrderId, OrderItem, OrderStatus, PaymentStatus};
use crate::payment::{PaymentEvent, PaymentEventKind, PaymentProvider, SessionLineItem, SessionRequest};
use crate::repository::OrderRepository;
use crate::shipping::ShippingRates;

const PENDING: (OrderStatus, PaymentStatus) = (OrderStatus::Pending, PaymentStatus::Pending);
const PAID: (OrderStatus, PaymentStatus) = (OrderStatus::Paid, PaymentStatus::Paid);
const CANCELLED: (OrderStatus, PaymentStatus) = (OrderStatus::Cancelled, PaymentStatus::Failed);

/// Upper bound on a single cart line. Weekly products are capped by their
/// allotment anyway, but unlimited-stock products would otherwise feed a raw
/// client quantity straight into the totals arithmetic.
const MAX_LINE_QUANTITY: i64 = 10_000;

/// Redirect targets handed to the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnUrls {
    pub success: String,
    pub cancel: String,
}

/// Successful checkout: where to send the customer next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    pub payment_url: String,
}

/// Disposition of a settlement callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// This callback won the status transition and moved the ledger.
    Applied,
    /// The order was already settled; the ledger was not touched.
    Ignored,
}

#[derive(Clone)]
pub struct CheckoutService<S, C, R, P> {
    gate: OrderingGate,
    ledger: StockLedger<S, C>,
    orders: R,
    payments: P,
    shipping: ShippingRates,
    urls: ReturnUrls,
}

impl<S, C, R, P> CheckoutService<S, C, R, P>
where
    S: StockStore,
    C: ProductCatalog,
    R: OrderRepository,
    P: PaymentProvider,
{
    pub fn new(
        gate: OrderingGate,
        ledger: StockLedger<S, C>,
        orders: R,
        payments: P,
        shipping: ShippingRates,
        urls: ReturnUrls,
    ) -> Self {
        Self {
            gate,
            ledger,
            orders,
            payments,
            shipping,
            urls,
        }
    }

    pub fn orders(&self) -> &R {
        &self.orders
    }

    pub fn ledger(&self) -> &StockLedger<S, C> {
        &self.ledger
    }

    /// Runs the whole checkout workflow against the current clock.
    pub async fn run_checkout(
        &self,
        cart: &Cart,
        customer: Customer,
        delivery: DeliveryMethod,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        self.run_checkout_at(cart, customer, delivery, Utc::now())
            .await
    }

    pub async fn run_checkout_at(
        &self,
        cart: &Cart,
        customer: Customer,
        delivery: DeliveryMethod,
        now: DateTime<Utc>,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        if cart.items.is_empty() {
            return Err(CheckoutError::validation("cart is empty"));
        }
        if let Some(bad) = cart
            .items
            .iter()
            .find(|i| i.quantity <= 0 || i.quantity > MAX_LINE_QUANTITY)
        {
            return Err(CheckoutError::validation(format!(
                "quantity for product {} must be between 1 and {MAX_LINE_QUANTITY}",
                bad.product_id
            )));
        }

        // 1. Gate. Closed is a distinct failure from out-of-stock.
        if !self.gate.is_open_at(now).await {
            return Err(CheckoutError::Closed);
        }
        // The order is pinned to this week even if time crosses into the
        // next one before payment settles.
        let week_id = self.gate.current_week_id_at(now).await;

        // 2. Availability pass over the whole cart; no partial reservation.
        let mut shortages = Vec::new();
        for item in &cart.items {
            match self
                .ledger
                .check_availability(item.product_id, item.quantity, week_id)
                .await
            {
                Ok(availability) if availability.available => {}
                Ok(availability) => shortages.push(ItemShortage {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: availability.current_available,
                }),
                Err(StockError::NotFound(_)) => shortages.push(ItemShortage {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: None,
                }),
                Err(err) => return Err(err.into()),
            }
        }
        if !shortages.is_empty() {
            return Err(CheckoutError::OutOfStock(shortages));
        }

        // 3. Totals from authoritative prices.
        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = self
                .ledger
                .catalog()
                .product(line.product_id)
                .await?
                .ok_or_else(|| {
                    CheckoutError::not_found(format!("product {}", line.product_id))
                })?;
            items.push(OrderItem {
                product_id: product.id,
                name: product.name,
                quantity: line.quantity,
                unit_price_cents: product.unit_price_cents,
            });
        }
        let subtotal_cents: i64 = items.iter().map(OrderItem::line_total_cents).sum();
        let shipping_cents = self.shipping.cost_cents(delivery);

        // 4. Durable order first, reservations after; a half-reserved order
        // is never left behind.
        let order = self
            .orders
            .create(Order {
                id: OrderId::random(),
                week_id,
                customer,
                delivery,
                status: PENDING.0,
                payment_status: PENDING.1,
                items,
                subtotal_cents,
                shipping_cents,
                total_cents: subtotal_cents + shipping_cents,
                created_at: now,
            })
            .await?;

        let mut reserved: Vec<(ProductId, i64)> = Vec::new();
        for item in &order.items {
            match self
                .ledger
                .reserve(item.product_id, item.quantity, week_id)
                .await
            {
                Ok(true) => reserved.push((item.product_id, item.quantity)),
                Ok(false) => {
                    // Lost the race between the availability pass and here.
                    self.unwind(&reserved, week_id).await;
                    self.cancel_order(order.id).await;
                    let available = self
                        .ledger
                        .check_availability(item.product_id, item.quantity, week_id)
                        .await
                        .ok()
                        .and_then(|a| a.current_available);
                    return Err(CheckoutError::OutOfStock(vec![ItemShortage {
                        product_id: item.product_id,
                        requested: item.quantity,
                        available,
                    }]));
                }
                Err(err) => {
                    self.unwind(&reserved, week_id).await;
                    self.cancel_order(order.id).await;
                    return Err(err.into());
                }
            }
        }

        // 5. Hosted payment session, correlated via opaque metadata.
        let request = SessionRequest {
            order_id: order.id,
            line_items: order
                .items
                .iter()
                .map(|i| SessionLineItem {
                    name: i.name.clone(),
                    quantity: i.quantity,
                    unit_price_cents: i.unit_price_cents,
                })
                .collect(),
            success_url: self.urls.success.clone(),
            cancel_url: self.urls.cancel.clone(),
            metadata: serde_json::json!({ "order_id": order.id }),
        };
        match self.payments.create_checkout_session(request).await {
            Ok(payment_url) => {
                tracing::info!(order = %order.id, week = %week_id, "checkout session created");
                Ok(CheckoutOutcome {
                    order_id: order.id,
                    payment_url,
                })
            }
            Err(err) => {
                self.unwind(&reserved, week_id).await;
                self.cancel_order(order.id).await;
                Err(err)
            }
        }
    }

    /// Applies a verified payment webhook.
    ///
    /// The status compare-and-set runs before any ledger mutation, so
    /// duplicate and out-of-order callbacks settle the ledger at most once.
    pub async fn handle_payment_event(
        &self,
        event: PaymentEvent,
    ) -> Result<CallbackOutcome, CheckoutError> {
        let order = self
            .orders
            .find(event.order_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found(format!("order {}", event.order_id)))?;
        match event.kind {
            PaymentEventKind::Succeeded => {
                if !self.orders.transition(order.id, PENDING, PAID).await? {
                    tracing::debug!(order = %order.id, "success callback for settled order ignored");
                    return Ok(CallbackOutcome::Ignored);
                }
                for (idx, item) in order.items.iter().enumerate() {
                    if let Err(err) = self
                        .ledger
                        .confirm_sale(item.product_id, item.quantity, order.week_id)
                        .await
                    {
                        self.warn_unsettled(&order, idx, &err);
                        return Err(err.into());
                    }
                }
                tracing::info!(order = %order.id, "order settled as paid");
                Ok(CallbackOutcome::Applied)
            }
            PaymentEventKind::Failed => {
                if !self.orders.transition(order.id, PENDING, CANCELLED).await? {
                    tracing::debug!(order = %order.id, "failure callback for settled order ignored");
                    return Ok(CallbackOutcome::Ignored);
                }
                for (idx, item) in order.items.iter().enumerate() {
                    if let Err(err) = self
                        .ledger
                        .release(item.product_id, item.quantity, order.week_id)
                        .await
                    {
                        self.warn_unsettled(&order, idx, &err);
                        return Err(err.into());
                    }
                }
                tracing::info!(order = %order.id, "order cancelled after failed payment");
                Ok(CallbackOutcome::Applied)
            }
        }
    }

    /// Admin re-seed of the weekly ledger; `None` targets the week
    /// containing the current instant.
    pub async fn resync_weekly_stock(
        &self,
        week_id: Option<WeekId>,
    ) -> Result<ResyncSummary, CheckoutError> {
        self.resync_weekly_stock_at(week_id, Utc::now()).await
    }

    pub async fn resync_weekly_stock_at(
        &self,
        week_id: Option<WeekId>,
        now: DateTime<Utc>,
    ) -> Result<ResyncSummary, CheckoutError> {
        let week_id = match week_id {
            Some(week_id) => week_id,
            None => self.gate.current_week_id_at(now).await,
        };
        Ok(self.ledger.resync_weekly_stock(week_id).await?)
    }

    /// The order already won its terminal status transition, so later
    /// callbacks are ignored; the remaining holds only ever get swept by the
    /// resync pass. Leave a trail naming them.
    fn warn_unsettled(&self, order: &Order, from: usize, err: &StockError) {
        let unsettled: Vec<String> = order.items[from..]
            .iter()
            .map(|i| format!("{}x{}", i.product_id, i.quantity))
            .collect();
        tracing::warn!(
            order = %order.id,
            week = %order.week_id,
            error = %err,
            ?unsettled,
            "settlement interrupted after status transition; holds left for resync"
        );
    }

    /// Best-effort release of already-placed holds, newest first. A release
    /// that fails here leaves an orphaned hold for the resync pass to sweep.
    async fn unwind(&self, reserved: &[(ProductId, i64)], week_id: WeekId) {
        for (product_id, quantity) in reserved.iter().rev() {
            if let Err(err) = self.ledger.release(*product_id, *quantity, week_id).await {
                tracing::error!(
                    product = %product_id,
                    quantity,
                    week = %week_id,
                    error = %err,
                    "failed to release reservation during unwind"
                );
            }
        }
    }

    async fn cancel_order(&self, id: OrderId) {
        match self.orders.transition(id, PENDING, CANCELLED).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(order = %id, "order left pending state before cancellation")
            }
            Err(err) => {
                tracing::error!(order = %id, error = %err, "failed to cancel order")
            }
        }
    }
}
