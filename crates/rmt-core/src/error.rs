//! Error types for the counter layer.

use thiserror::Error;

/// Errors that can occur in counter operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CounterError {
    #[error("insufficient quota: requested {requested}, available {available}")]
    InsufficientQuota { requested: u64, available: i64 },

    #[error("transfer to self is not allowed")]
    SelfTransfer,
}

pub type Result<T> = std::result::Result<T, CounterError>;
