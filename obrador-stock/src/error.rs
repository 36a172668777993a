/// Errors surfaced by ledger operations.
///
/// Expected business outcomes (a reservation losing the race for the last
/// unit, a product with unlimited stock) are *not* errors; they come back as
/// ordinary values so the orchestrator can branch on them. These variants
/// cover rejected input, missing rows and infrastructure faults.
#[derive(Debug)]
pub enum StockError {
    /// Malformed input, rejected before touching the store.
    Validation(String),
    /// A new `max_stock` would leave committed obligations above capacity.
    Capacity {
        requested: i64,
        /// Minimum acceptable ceiling: confirmed sold plus outstanding holds.
        required: i64,
    },
    /// A row or product that was assumed to exist does not.
    NotFound(String),
    /// The record store failed; wraps the backend's own error.
    Store(Box<dyn std::error::Error + Send + Sync>),
}

impl StockError {
    /// Construct a `Store` variant from any backend error type.
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StockError::Store(Box::new(err))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        StockError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        StockError::NotFound(msg.into())
    }
}

impl std::fmt::Display for StockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockError::Validation(msg) => write!(f, "Invalid input: {msg}"),
            StockError::Capacity {
                requested,
                required,
            } => write!(
                f,
                "Capacity too low: requested max {requested}, committed obligations need {required}"
            ),
            StockError::NotFound(msg) => write!(f, "Not found: {msg}"),
            StockError::Store(err) => write!(f, "Store error: {err}"),
        }
    }
}

impl std::error::Error for StockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StockError::Store(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
