//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown application status: {0}")]
    UnknownStatus(String),

    #[error("Unknown transaction type: {0}")]
    UnknownTransactionType(String),

    #[error("Insufficient balance: {balance} tokens available, adjustment of {amount} requested")]
    NegativeBalance { balance: i64, amount: i64 },

    #[error("{0}")]
    Invalid(String),
}
