//! # obrador-checkout — checkout orchestration
//!
//! Turns a cart into a paid order without losing or double-counting stock.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CheckoutService`] | The orchestrator: gate → check → order → reserve → pay → settle |
//! | [`OrderRepository`] | Durable order storage with a compare-and-set status transition |
//! | [`PaymentProvider`] | Hosted checkout-session creation |
//! | [`ShippingRates`] | Per-delivery-method cost lookup |
//! | [`MemoryOrderRepository`] | DashMap-backed repository for tests and single-process use |
//!
//! # Settlement idempotence
//!
//! Payment webhooks can arrive duplicated or out of order. Settlement always
//! wins an atomic `PENDING → terminal` status transition *before* touching
//! the ledger; a callback that loses the transition is ignored, so a second
//! success never double-depletes stock and a late failure never undoes a
//! confirmed sale.

pub mod checkout;
pub mod error;
pub mod order;
pub mod payment;
pub mod repository;
pub mod shipping;

pub use checkout::{CallbackOutcome, CheckoutOutcome, CheckoutService, ReturnUrls};
pub use error::{CheckoutError, ItemShortage};
pub use order::{Cart, CartItem, Customer, Order, OrderId, OrderItem, OrderStatus, PaymentStatus};
pub use payment::{PaymentEvent, PaymentEventKind, PaymentProvider, SessionLineItem, SessionRequest};
pub use repository::{MemoryOrderRepository, OrderRepository};
pub use shipping::ShippingRates;

pub mod prelude {
    //! Re-exports of the most commonly used checkout types.
    pub use crate::{
        Cart, CartItem, CheckoutError, CheckoutService, Customer, Order, OrderId, OrderRepository,
        OrderStatus, PaymentEvent, PaymentEventKind, PaymentProvider, PaymentStatus, ShippingRates,
    };
}
