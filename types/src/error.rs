//! Parse and conversion errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid base58 string: {0}")]
    InvalidBase58(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount has more than {max} decimal places")]
    TooPrecise { max: usize },

    #[error("amount does not fit in a u64 of lamports")]
    AmountOverflow,

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("unknown commitment level: {0}")]
    UnknownCommitment(String),
}
