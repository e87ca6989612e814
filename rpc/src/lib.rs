//! JSON-RPC client for a Solana cluster.
//!
//! Provides:
//! - the [`ChainClient`] trait every component talks to
//! - [`HttpRpcClient`], its reqwest-backed implementation
//! - the request/response envelopes of the methods solwatch uses

pub mod client;
pub mod error;
pub mod responses;

use async_trait::async_trait;
use solwatch_types::{Blockhash, Commitment, Lamports, Pubkey, Signature};

pub use client::{HttpRpcClient, RpcClientConfig};
pub use error::RpcError;

/// Request/response operations against the active endpoint.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Balance of `address` in lamports.
    async fn get_balance(
        &self,
        address: &Pubkey,
        commitment: Commitment,
    ) -> Result<Lamports, RpcError>;

    /// A blockhash recent enough to bound a new transaction's lifetime.
    async fn get_latest_blockhash(&self, commitment: Commitment) -> Result<Blockhash, RpcError>;

    /// Submit a fully signed transaction in wire format.
    async fn send_transaction(
        &self,
        wire: &[u8],
        commitment: Commitment,
    ) -> Result<Signature, RpcError>;

    /// Resolve once `signature` has reached `commitment`, or fail if the
    /// transaction errored or did not land in time.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: Commitment,
    ) -> Result<(), RpcError>;
}
