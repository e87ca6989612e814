use solwatch_rpc::RpcError;
use solwatch_transactions::TransactionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet not connected")]
    NotConnected,

    #[error("no wallet named {0}")]
    UnknownWallet(String),

    #[error("no wallet selected")]
    NoneSelected,

    #[error("key error: {0}")]
    Key(#[from] solwatch_crypto::CryptoError),

    #[error("wallet cannot sign for {0}")]
    CannotSign(String),

    #[error("transaction building error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("{0}")]
    Other(String),
}
