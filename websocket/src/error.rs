use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PubsubError {
    #[error("websocket connect to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("websocket connection closed")]
    Closed,

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
