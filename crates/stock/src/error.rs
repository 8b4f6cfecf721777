use thiserror::Error;

use foodbank_core::DomainError;

/// Result type used by the stock engine.
pub type StockResult<T> = Result<T, StockError>;

/// Stock engine failures.
///
/// Only precondition violations live here. A shortage during allocation is a
/// normal outcome and is reported on [`crate::AllocationResult`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// A quantity argument was zero or negative.
    #[error("invalid quantity: {quantity} (must be > 0)")]
    InvalidQuantity { quantity: i64 },

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A writer panicked while holding the engine lock.
    #[error("stock state lock poisoned")]
    Poisoned,
}
