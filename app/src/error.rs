use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] solwatch_store::StoreError),

    #[error("RPC error: {0}")]
    Rpc(#[from] solwatch_rpc::RpcError),

    #[error("pubsub error: {0}")]
    Pubsub(#[from] solwatch_websocket::PubsubError),

    #[error("wallet error: {0}")]
    Wallet(#[from] solwatch_wallet_core::WalletError),

    #[error("no wallet is connected")]
    NoWallet,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
