use obrador_stock::StockError;

/// Extension trait for converting `sqlx::Error` into `StockError`.
///
/// Due to Rust's orphan rules, `From<sqlx::Error> for StockError` can't be
/// implemented here. Use `.into_stock_error()` instead.
pub trait SqlxStockErrorExt {
    fn into_stock_error(self) -> StockError;
}

impl SqlxStockErrorExt for sqlx::Error {
    fn into_stock_error(self) -> StockError {
        match &self {
            sqlx::Error::RowNotFound => StockError::not_found("row not found"),
            _ => StockError::store(self),
        }
    }
}
