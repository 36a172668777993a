use obrador_core::ProductId;
use obrador_stock::StockError;
use serde::{Deserialize, Serialize};

/// One cart line that cannot be fulfilled, reported per item so the client
/// can adjust quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemShortage {
    pub product_id: ProductId,
    pub requested: i64,
    /// Units sellable at check time; `None` when the product vanished.
    pub available: Option<i64>,
}

/// Errors surfaced by checkout orchestration.
///
/// `Closed` and `OutOfStock` are deliberately distinct: the storefront shows
/// a countdown for one and per-item adjustments for the other.
#[derive(Debug)]
pub enum CheckoutError {
    /// The ordering window is closed; nothing was reserved.
    Closed,
    /// One or more cart lines are short; nothing was reserved (or every
    /// partial reservation was rolled back).
    OutOfStock(Vec<ItemShortage>),
    /// Malformed cart or configuration input.
    Validation(String),
    /// Referenced order or product does not exist.
    NotFound(String),
    /// The payment provider failed; reservations were unwound.
    Payment(Box<dyn std::error::Error + Send + Sync>),
    /// The stock ledger failed with an infrastructure fault.
    Stock(StockError),
    /// The order store failed.
    Store(Box<dyn std::error::Error + Send + Sync>),
}

impl CheckoutError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CheckoutError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CheckoutError::NotFound(msg.into())
    }

    /// Construct a `Payment` variant from any provider error type.
    pub fn payment(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CheckoutError::Payment(Box::new(err))
    }

    /// Construct a `Store` variant from any backend error type.
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CheckoutError::Store(Box::new(err))
    }
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutError::Closed => write!(f, "Ordering is currently closed"),
            CheckoutError::OutOfStock(items) => {
                write!(f, "Out of stock for {} item(s)", items.len())
            }
            CheckoutError::Validation(msg) => write!(f, "Invalid input: {msg}"),
            CheckoutError::NotFound(msg) => write!(f, "Not found: {msg}"),
            CheckoutError::Payment(err) => write!(f, "Payment provider error: {err}"),
            CheckoutError::Stock(err) => write!(f, "Stock ledger error: {err}"),
            CheckoutError::Store(err) => write!(f, "Order store error: {err}"),
        }
    }
}

impl std::error::Error for CheckoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckoutError::Payment(err) | CheckoutError::Store(err) => Some(err.as_ref()),
            CheckoutError::Stock(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StockError> for CheckoutError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::Validation(msg) => CheckoutError::Validation(msg),
            StockError::NotFound(msg) => CheckoutError::NotFound(msg),
            other => CheckoutError::Stock(other),
        }
    }
}
