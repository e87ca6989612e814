//! Balance snapshots and user-facing fetch errors.

use std::fmt;

use solwatch_rpc::RpcError;
use solwatch_types::Lamports;

/// Why a balance query failed, as shown to the user.
///
/// Classification looks at the error text only, since providers report rate
/// limiting and access denial in the message body as often as in the status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BalanceError {
    RateLimited,
    Forbidden,
    FetchFailed,
}

impl BalanceError {
    pub fn classify(error: &impl fmt::Display) -> Self {
        let text = error.to_string();
        if text.contains("429") {
            BalanceError::RateLimited
        } else if text.contains("403") {
            BalanceError::Forbidden
        } else {
            BalanceError::FetchFailed
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            BalanceError::RateLimited => {
                "Too many requests. Please wait a few seconds and try again."
            }
            BalanceError::Forbidden => {
                "Access forbidden. Please check your RPC endpoint or try again later."
            }
            BalanceError::FetchFailed => "Failed to fetch balance. Please try again.",
        }
    }
}

impl fmt::Display for BalanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BalanceState {
    #[default]
    NotFetched,
    Loaded(Lamports),
    Failed(BalanceError),
}

impl BalanceState {
    pub fn from_result(result: &Result<Lamports, RpcError>) -> Self {
        match result {
            Ok(lamports) => BalanceState::Loaded(*lamports),
            Err(e) => BalanceState::Failed(BalanceError::classify(e)),
        }
    }

    pub fn lamports(&self) -> Option<Lamports> {
        match self {
            BalanceState::Loaded(lamports) => Some(*lamports),
            _ => None,
        }
    }

    /// True once a query has answered, successfully or not.
    pub fn is_settled(&self) -> bool {
        !matches!(self, BalanceState::NotFetched)
    }
}

impl fmt::Display for BalanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceState::NotFetched => f.write_str("Loading..."),
            BalanceState::Loaded(lamports) => write!(f, "{lamports}"),
            BalanceState::Failed(_) => f.write_str("Error or not found"),
        }
    }
}
