pub mod json;
pub mod receipt;
pub mod tx;

pub use json::*;
pub use receipt::serialize_receipt;
pub use tx::check_transaction;

use thiserror::Error;

/// Errors from interpreting execution-layer JSON and RLP data.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid hex in field {field}: {reason}")]
    InvalidHex { field: String, reason: String },

    #[error("missing field {0}")]
    MissingField(String),

    #[error("unexpected JSON shape for {0}")]
    UnexpectedJson(String),

    #[error("invalid transaction encoding: {0}")]
    InvalidTransaction(String),

    #[error("claimed {field} does not match the proven value")]
    Mismatch { field: &'static str },
}
