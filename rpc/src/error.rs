//! RPC client error types.
//!
//! Display strings keep the HTTP status code and the server's message
//! verbatim so callers can classify failures (rate limiting, access denied)
//! from the text alone.

use solwatch_types::Signature;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("transaction {signature} failed: {reason}")]
    TransactionFailed { signature: Signature, reason: String },

    #[error("transaction {0} was not confirmed in time")]
    ConfirmationTimeout(Signature),
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => RpcError::HttpStatus {
                status: status.as_u16(),
                body: e.to_string(),
            },
            None => RpcError::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_is_part_of_the_message() {
        let err = RpcError::HttpStatus {
            status: 429,
            body: "Too Many Requests".into(),
        };
        assert_eq!(err.to_string(), "HTTP 429: Too Many Requests");
    }
}
