//! Balance and transaction watcher for a fixed list of addresses.
//!
//! The watcher holds no connection of its own. Balance batches
//! ([`fetch_all`]) and subscription wiring ([`subscribe_all`],
//! [`release_all`]) run as runtime tasks against the active connection;
//! their results are fed back in on the event loop.

use std::collections::HashSet;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc;

use solwatch_rpc::ChainClient;
use solwatch_types::{Commitment, Pubkey};
use solwatch_websocket::{LogEvent, LogSubscriber, PubsubEvent, SubscriptionId};

use crate::balance::BalanceState;
use crate::notifications::NotificationLog;

/// Commitment used for log subscriptions.
pub const SUBSCRIPTION_COMMITMENT: Commitment = Commitment::Confirmed;

/// Query every address concurrently. A failed query marks only its own
/// address as failed.
pub async fn fetch_all(
    client: &dyn ChainClient,
    addresses: &[Pubkey],
    commitment: Commitment,
) -> Vec<BalanceState> {
    let queries = addresses.iter().map(|address| async move {
        let result = client.get_balance(address, commitment).await;
        if let Err(e) = &result {
            tracing::warn!(%address, error = %e, "balance query failed");
        }
        BalanceState::from_result(&result)
    });
    join_all(queries).await
}

/// Subscriptions opened (and addresses that could not be subscribed) by one
/// [`subscribe_all`] run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Wiring {
    pub opened: Vec<(Pubkey, SubscriptionId)>,
    pub failed: Vec<Pubkey>,
}

/// Subscribe every address concurrently. Each attempt is bounded by
/// `timeout`; an attempt that errors or times out is listed in
/// [`Wiring::failed`] and does not hold up the others.
pub async fn subscribe_all(
    subscriber: &dyn LogSubscriber,
    addresses: &[Pubkey],
    sink: &mpsc::UnboundedSender<PubsubEvent>,
    timeout: Duration,
) -> Wiring {
    let attempts = addresses.iter().map(|address| async move {
        let attempt = subscriber.subscribe_logs(address, SUBSCRIPTION_COMMITMENT, sink.clone());
        match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok(id)) => {
                tracing::debug!(%address, subscription = %id, "log subscription opened");
                Ok((*address, id))
            }
            Ok(Err(e)) => {
                tracing::warn!(%address, error = %e, "log subscription failed");
                Err(*address)
            }
            Err(_) => {
                tracing::warn!(%address, ?timeout, "log subscription timed out");
                Err(*address)
            }
        }
    });

    let mut wiring = Wiring::default();
    for outcome in join_all(attempts).await {
        match outcome {
            Ok(opened) => wiring.opened.push(opened),
            Err(address) => wiring.failed.push(address),
        }
    }
    tracing::info!(
        opened = wiring.opened.len(),
        failed = wiring.failed.len(),
        "log subscriptions wired"
    );
    wiring
}

/// Release `subscriptions` on `subscriber`, each bounded by `timeout`.
/// Returns how many were handed in.
pub async fn release_all(
    subscriber: &dyn LogSubscriber,
    subscriptions: Vec<(Pubkey, SubscriptionId)>,
    timeout: Duration,
) -> usize {
    let count = subscriptions.len();
    let releases = subscriptions.into_iter().map(|(address, id)| async move {
        match tokio::time::timeout(timeout, subscriber.unsubscribe_logs(id)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(%address, subscription = %id, error = %e, "log unsubscribe failed")
            }
            Err(_) => tracing::debug!(%address, subscription = %id, "log unsubscribe timed out"),
        }
    });
    join_all(releases).await;
    count
}

/// First wait before subscribing a dropped address again. Doubles with each
/// further attempt.
pub const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(1);

/// Attempts made to subscribe a dropped address again before giving up.
pub const RESUBSCRIBE_ATTEMPTS: u32 = 5;

/// Wait before resubscribe attempt `attempt` (1-based).
pub fn resubscribe_delay(attempt: u32) -> Duration {
    RESUBSCRIBE_DELAY * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Identifies one balance batch; only the latest batch may complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchTicket {
    generation: u64,
}

pub struct Watcher {
    addresses: Vec<Pubkey>,
    balances: Vec<BalanceState>,
    loading: bool,
    generation: u64,
    subscriptions: Vec<(Pubkey, SubscriptionId)>,
    /// Drops reported before the subscription itself was recorded.
    unclaimed_drops: HashSet<SubscriptionId>,
    subscription_failures: usize,
    notifications: NotificationLog,
}

impl Watcher {
    pub fn new(addresses: Vec<Pubkey>, notification_limit: Option<usize>) -> Self {
        let balances = vec![BalanceState::NotFetched; addresses.len()];
        Self {
            addresses,
            balances,
            loading: false,
            generation: 0,
            subscriptions: Vec::new(),
            unclaimed_drops: HashSet::new(),
            subscription_failures: 0,
            notifications: NotificationLog::new(notification_limit),
        }
    }

    pub fn addresses(&self) -> &[Pubkey] {
        &self.addresses
    }

    /// Start a new batch, superseding any batch still in flight.
    pub fn begin_batch(&mut self) -> BatchTicket {
        self.generation += 1;
        self.loading = true;
        BatchTicket {
            generation: self.generation,
        }
    }

    /// Store a batch's results. Returns false when the batch was superseded
    /// and its results were discarded.
    pub fn finish_batch(&mut self, ticket: BatchTicket, results: Vec<BalanceState>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding superseded balance batch"
            );
            return false;
        }
        if results.len() != self.addresses.len() {
            tracing::warn!(
                expected = self.addresses.len(),
                actual = results.len(),
                "balance batch has the wrong size"
            );
        }
        for (slot, state) in self.balances.iter_mut().zip(results) {
            *slot = state;
        }
        self.loading = false;
        true
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn balances(&self) -> impl Iterator<Item = (&Pubkey, &BalanceState)> {
        self.addresses.iter().zip(&self.balances)
    }

    pub fn balance_of(&self, address: &Pubkey) -> Option<&BalanceState> {
        self.balances().find(|(a, _)| *a == address).map(|(_, state)| state)
    }

    /// Record the outcome of a [`subscribe_all`] run. Returns the addresses
    /// whose new subscription was already reported dropped and so must be
    /// subscribed again.
    pub fn record_wiring(&mut self, wiring: Wiring) -> Vec<Pubkey> {
        self.subscription_failures += wiring.failed.len();
        let mut resubscribe = Vec::new();
        for (address, id) in wiring.opened {
            if self.unclaimed_drops.remove(&id) {
                resubscribe.push(address);
            } else {
                self.subscriptions.push((address, id));
            }
        }
        resubscribe
    }

    /// Forget a subscription the server dropped. Returns false when `id` is
    /// not recorded yet; the drop is then applied by [`Watcher::record_wiring`].
    pub fn subscription_dropped(&mut self, id: SubscriptionId) -> bool {
        match self.subscriptions.iter().position(|(_, live)| *live == id) {
            Some(index) => {
                self.subscriptions.swap_remove(index);
                true
            }
            None => {
                self.unclaimed_drops.insert(id);
                false
            }
        }
    }

    /// Hand over every recorded subscription for release.
    pub fn take_subscriptions(&mut self) -> Vec<(Pubkey, SubscriptionId)> {
        self.unclaimed_drops.clear();
        std::mem::take(&mut self.subscriptions)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Subscribe attempts that failed or timed out, over the watcher's life.
    pub fn subscription_failures(&self) -> usize {
        self.subscription_failures
    }

    pub fn record_log(&mut self, event: &LogEvent) {
        tracing::info!(
            address = %event.address,
            signature = %event.signature,
            slot = event.slot,
            "transaction detected"
        );
        self.notifications
            .push(NotificationLog::format(&event.address, &event.signature));
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }
}
