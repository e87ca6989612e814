//! reqwest-backed JSON-RPC client.

use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde_json::json;
use solwatch_types::{Blockhash, Commitment, Lamports, Pubkey, Signature};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::error::RpcError;
use crate::responses::{LatestBlockhash, RpcRequest, RpcResponse, SignatureStatus, WithContext};
use crate::ChainClient;

/// Timeouts for [`HttpRpcClient`].
#[derive(Clone, Debug)]
pub struct RpcClientConfig {
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// How long `confirm_transaction` keeps polling.
    pub confirm_timeout: Duration,
    /// Delay between signature status polls.
    pub poll_interval: Duration,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            confirm_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// HTTP client for a cluster's JSON-RPC endpoint.
///
/// Wraps `reqwest::Client` with the endpoint URL and provides typed methods
/// for each RPC method the application needs.
#[derive(Debug)]
pub struct HttpRpcClient {
    http: reqwest::Client,
    url: String,
    config: RpcClientConfig,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a client targeting `url` (e.g. `https://api.devnet.solana.com`).
    pub fn new(url: impl Into<String>, config: RpcClientConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RpcError::ClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a JSON-RPC request and decode its `result` field.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, url = %self.url, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = match body.trim() {
                "" => status.canonical_reason().unwrap_or("").to_string(),
                text => text.to_string(),
            };
            return Err(RpcError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        if let Some(err) = envelope.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        envelope
            .result
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method}: missing result")))
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, RpcError> {
        let statuses: WithContext<Vec<Option<SignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([[signature.to_string()], { "searchTransactionHistory": false }]),
            )
            .await?;
        Ok(statuses.value.into_iter().next().flatten())
    }
}

#[async_trait]
impl ChainClient for HttpRpcClient {
    async fn get_balance(
        &self,
        address: &Pubkey,
        commitment: Commitment,
    ) -> Result<Lamports, RpcError> {
        let balance: WithContext<u64> = self
            .call(
                "getBalance",
                json!([address.to_string(), { "commitment": commitment.as_str() }]),
            )
            .await?;
        Ok(Lamports::new(balance.value))
    }

    async fn get_latest_blockhash(&self, commitment: Commitment) -> Result<Blockhash, RpcError> {
        let latest: WithContext<LatestBlockhash> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": commitment.as_str() }]),
            )
            .await?;
        latest
            .value
            .blockhash
            .parse()
            .map_err(|e| RpcError::InvalidResponse(format!("blockhash: {e}")))
    }

    async fn send_transaction(
        &self,
        wire: &[u8],
        commitment: Commitment,
    ) -> Result<Signature, RpcError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(wire);
        let signature: String = self
            .call(
                "sendTransaction",
                json!([
                    encoded,
                    { "encoding": "base64", "preflightCommitment": commitment.as_str() }
                ]),
            )
            .await?;
        signature
            .parse()
            .map_err(|e| RpcError::InvalidResponse(format!("signature: {e}")))
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: Commitment,
    ) -> Result<(), RpcError> {
        let deadline = tokio::time::Instant::now() + self.config.confirm_timeout;
        loop {
            if let Some(status) = self.signature_status(signature).await? {
                if let Some(err) = status.err {
                    return Err(RpcError::TransactionFailed {
                        signature: *signature,
                        reason: err.to_string(),
                    });
                }
                let reached = status
                    .confirmation_status
                    .as_deref()
                    .and_then(|s| s.parse::<Commitment>().ok())
                    // Older nodes omit the field; a null `confirmations` means rooted.
                    .or_else(|| status.confirmations.is_none().then_some(Commitment::Finalized));
                if reached.is_some_and(|level| commitment.is_satisfied_by(level)) {
                    debug!(%signature, slot = status.slot, "transaction confirmed");
                    return Ok(());
                }
            }
            if tokio::time::Instant::now() + self.config.poll_interval > deadline {
                return Err(RpcError::ConfirmationTimeout(*signature));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
