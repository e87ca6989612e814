use solwatch_types::Pubkey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("amount must be positive")]
    ZeroAmount,

    #[error("{0} is not a required signer of this transaction")]
    UnknownSigner(Pubkey),

    #[error("transaction is missing {missing} signature(s)")]
    MissingSignatures { missing: usize },

    #[error("too many {what} for the wire format: {count}")]
    TooMany { what: &'static str, count: usize },
}
