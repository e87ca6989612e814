//! Nullable chain: scripted RPC answers and in-process log subscriptions.

use async_trait::async_trait;
use solwatch_rpc::{ChainClient, RpcError};
use solwatch_types::{Blockhash, Commitment, Lamports, Pubkey, Signature};
use solwatch_websocket::{LogEvent, LogSubscriber, PubsubError, PubsubEvent, SubscriptionId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct ChainState {
    balances: HashMap<Pubkey, Lamports>,
    balance_failures: HashMap<Pubkey, RpcError>,
    balance_calls: Vec<Pubkey>,
    latency: Option<Duration>,

    blockhash: Option<Blockhash>,
    blockhash_calls: usize,

    sent: Vec<Vec<u8>>,
    send_failure: Option<RpcError>,
    confirmed: Vec<Signature>,
    confirm_failure: Option<RpcError>,

    next_subscription: u64,
    subscriptions: HashMap<SubscriptionId, (Pubkey, mpsc::UnboundedSender<PubsubEvent>)>,
    subscribe_failures: HashSet<Pubkey>,
    stalled: bool,
    opened: usize,
    released: usize,
    slot: u64,
}

/// A test chain that answers RPC calls from scripted state and records them.
///
/// Clones share state, so a test can keep one handle for assertions while the
/// code under test owns another.
#[derive(Clone, Default)]
pub struct NullChain {
    state: Arc<Mutex<ChainState>>,
}

impl NullChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ChainState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    // ── Balances ────────────────────────────────────────────────────────

    pub fn set_balance(&self, address: Pubkey, lamports: Lamports) {
        self.with_state(|s| {
            s.balance_failures.remove(&address);
            s.balances.insert(address, lamports);
        });
    }

    /// Make balance queries for `address` fail with `error`.
    pub fn fail_balance(&self, address: Pubkey, error: RpcError) {
        self.with_state(|s| {
            s.balance_failures.insert(address, error);
        });
    }

    /// Delay every balance query by `latency` (tokio time, so paused clocks apply).
    pub fn set_latency(&self, latency: Duration) {
        self.with_state(|s| s.latency = Some(latency));
    }

    pub fn balance_calls(&self) -> usize {
        self.with_state(|s| s.balance_calls.len())
    }

    pub fn balance_calls_for(&self, address: &Pubkey) -> usize {
        self.with_state(|s| s.balance_calls.iter().filter(|a| *a == address).count())
    }

    // ── Transactions ────────────────────────────────────────────────────

    pub fn set_blockhash(&self, blockhash: Blockhash) {
        self.with_state(|s| s.blockhash = Some(blockhash));
    }

    pub fn blockhash_calls(&self) -> usize {
        self.with_state(|s| s.blockhash_calls)
    }

    pub fn fail_send(&self, error: RpcError) {
        self.with_state(|s| s.send_failure = Some(error));
    }

    pub fn fail_confirm(&self, error: RpcError) {
        self.with_state(|s| s.confirm_failure = Some(error));
    }

    /// Wire bytes of every submitted transaction, in order.
    pub fn sent_transactions(&self) -> Vec<Vec<u8>> {
        self.with_state(|s| s.sent.clone())
    }

    pub fn confirmed(&self) -> Vec<Signature> {
        self.with_state(|s| s.confirmed.clone())
    }

    // ── Subscriptions ───────────────────────────────────────────────────

    /// Make `logsSubscribe` for `address` fail.
    pub fn fail_subscribe(&self, address: Pubkey) {
        self.with_state(|s| {
            s.subscribe_failures.insert(address);
        });
    }

    /// Make every later `logsSubscribe` hang forever, like a websocket
    /// that accepts the TCP connection and never answers.
    pub fn stall_subscriptions(&self) {
        self.with_state(|s| s.stalled = true);
    }

    pub fn subscriptions_opened(&self) -> usize {
        self.with_state(|s| s.opened)
    }

    pub fn subscriptions_released(&self) -> usize {
        self.with_state(|s| s.released)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.with_state(|s| s.subscriptions.len())
    }

    /// Deliver a transaction notification to every live subscription on
    /// `address`. Returns how many subscriptions received it.
    pub fn emit_log(&self, address: &Pubkey, signature: Signature) -> usize {
        self.with_state(|s| {
            s.slot += 1;
            let slot = s.slot;
            s.subscriptions
                .iter()
                .filter(|(_, (watched, _))| watched == address)
                .filter(|(id, (_, sink))| {
                    sink.send(PubsubEvent::Log(LogEvent {
                        subscription: **id,
                        address: *address,
                        signature,
                        slot,
                        err: None,
                    }))
                    .is_ok()
                })
                .count()
        })
    }

    /// Simulate the server closing the socket: every live subscription is
    /// forgotten and reports `Dropped` to its sink. Returns how many were
    /// dropped.
    pub fn drop_connection(&self) -> usize {
        self.with_state(|s| {
            let dropped = std::mem::take(&mut s.subscriptions);
            let count = dropped.len();
            for (subscription, (address, sink)) in dropped {
                let _ = sink.send(PubsubEvent::Dropped {
                    subscription,
                    address,
                });
            }
            count
        })
    }
}

#[async_trait]
impl ChainClient for NullChain {
    async fn get_balance(
        &self,
        address: &Pubkey,
        _commitment: Commitment,
    ) -> Result<Lamports, RpcError> {
        let latency = self.with_state(|s| {
            s.balance_calls.push(*address);
            s.latency
        });
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.with_state(|s| match s.balance_failures.get(address) {
            Some(err) => Err(err.clone()),
            None => Ok(s.balances.get(address).copied().unwrap_or(Lamports::ZERO)),
        })
    }

    async fn get_latest_blockhash(&self, _commitment: Commitment) -> Result<Blockhash, RpcError> {
        Ok(self.with_state(|s| {
            s.blockhash_calls += 1;
            s.blockhash.unwrap_or(Blockhash::new([1; 32]))
        }))
    }

    async fn send_transaction(
        &self,
        wire: &[u8],
        _commitment: Commitment,
    ) -> Result<Signature, RpcError> {
        self.with_state(|s| {
            if let Some(err) = &s.send_failure {
                return Err(err.clone());
            }
            s.sent.push(wire.to_vec());
            // The first signature follows the one-byte signature count.
            let signature = wire
                .get(1..65)
                .and_then(|bytes| <[u8; 64]>::try_from(bytes).ok())
                .map(Signature::new)
                .ok_or_else(|| RpcError::InvalidResponse("transaction too short".into()))?;
            Ok(signature)
        })
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        _commitment: Commitment,
    ) -> Result<(), RpcError> {
        self.with_state(|s| {
            if let Some(err) = &s.confirm_failure {
                return Err(err.clone());
            }
            s.confirmed.push(*signature);
            Ok(())
        })
    }
}

#[async_trait]
impl LogSubscriber for NullChain {
    async fn subscribe_logs(
        &self,
        address: &Pubkey,
        _commitment: Commitment,
        sink: mpsc::UnboundedSender<PubsubEvent>,
    ) -> Result<SubscriptionId, PubsubError> {
        if self.with_state(|s| s.stalled) {
            std::future::pending::<()>().await;
        }
        self.with_state(|s| {
            if s.subscribe_failures.contains(address) {
                return Err(PubsubError::Rpc {
                    code: -32602,
                    message: format!("cannot subscribe to {address}"),
                });
            }
            s.next_subscription += 1;
            let id = SubscriptionId(s.next_subscription);
            s.subscriptions.insert(id, (*address, sink));
            s.opened += 1;
            Ok(id)
        })
    }

    async fn unsubscribe_logs(&self, id: SubscriptionId) -> Result<(), PubsubError> {
        self.with_state(|s| {
            if s.subscriptions.remove(&id).is_some() {
                s.released += 1;
            }
            Ok(())
        })
    }
}
