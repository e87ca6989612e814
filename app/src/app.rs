//! The runtime that wires the network selector, the watcher and the wallet
//! session to the active connection.
//!
//! All component state lives here and is only touched from the event loop
//! ([`App::next_event`]). I/O runs in a `JoinSet`; completions come back as
//! [`TaskOutput`] values and are applied in order. No operation awaits the
//! network itself, so a hung RPC node or websocket never stalls the loop.
//!
//! Pubsub events arrive on an unbounded channel that is replaced whenever the
//! endpoint changes, so events from released subscriptions are never
//! recorded. A subscription the server drops is subscribed again with
//! backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{sleep, sleep_until, Instant};

use solwatch_rpc::ChainClient;
use solwatch_store::PreferenceStore;
use solwatch_types::{Commitment, Endpoint, Network, Pubkey, Signature};
use solwatch_wallet_core::{build_transfer, WalletAdapter, WalletError, WalletRegistry};
use solwatch_websocket::{LogSubscriber, PubsubEvent, SubscriptionId};

use crate::balance::BalanceState;
use crate::config::AppConfig;
use crate::connection::{Connection, Connector};
use crate::network_selector::NetworkSelector;
use crate::notifications::NotificationLog;
use crate::session::{RefreshOutcome, SessionAction, SessionError, TransferRequest, WalletSession};
use crate::watcher::{
    fetch_all, release_all, resubscribe_delay, subscribe_all, BatchTicket, Watcher, Wiring,
    RESUBSCRIBE_ATTEMPTS,
};
use crate::AppError;

/// Something the front end may want to redraw for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    BalancesUpdated { loaded: usize, failed: usize },
    SubscriptionsWired { opened: usize, failed: usize },
    /// The server dropped the subscription for this address; it is being
    /// subscribed again.
    SubscriptionDropped(Pubkey),
    SessionBalance(BalanceState),
    TransferSucceeded(Signature),
    TransferFailed(String),
    Notification(String),
    DeadlineReached,
}

enum TaskOutput {
    Batch {
        ticket: BatchTicket,
        results: Vec<BalanceState>,
    },
    Subscribed {
        generation: u64,
        /// 0 for the first wiring on an endpoint, then the resubscribe attempt.
        attempt: u32,
        pubsub: Arc<dyn LogSubscriber>,
        wiring: Wiring,
    },
    SessionBalance {
        generation: u64,
        owner: Pubkey,
        result: BalanceState,
    },
    Transfer {
        result: Result<Signature, String>,
    },
}

pub struct App {
    config: AppConfig,
    connector: Arc<dyn Connector>,
    selector: NetworkSelector,
    connection: Connection,
    /// Bumped on every endpoint change.
    generation: u64,
    started: bool,
    watcher: Watcher,
    session: WalletSession,
    wallets: WalletRegistry,
    wallet: Option<Arc<dyn WalletAdapter>>,
    tasks: JoinSet<TaskOutput>,
    /// Unsubscribes on connections that are no longer active.
    releases: JoinSet<usize>,
    log_tx: mpsc::UnboundedSender<PubsubEvent>,
    log_rx: mpsc::UnboundedReceiver<PubsubEvent>,
}

impl App {
    /// Restore the network selection and open a connection to it. Nothing is
    /// subscribed or fetched until [`App::start`].
    pub fn new(
        config: AppConfig,
        store: Arc<dyn PreferenceStore>,
        connector: Arc<dyn Connector>,
        wallets: WalletRegistry,
    ) -> Result<Self, AppError> {
        let selector =
            NetworkSelector::load(store, config.endpoint_overrides(), config.default_network);
        let connection = connector.connect(selector.endpoint())?;
        let watcher = Watcher::new(config.watch_list.clone(), config.notification_limit);
        let session = WalletSession::new(config.refresh_cooldown(), config.notice_duration());
        let (log_tx, log_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            connector,
            selector,
            connection,
            generation: 0,
            started: false,
            watcher,
            session,
            wallets,
            wallet: None,
            tasks: JoinSet::new(),
            releases: JoinSet::new(),
            log_tx,
            log_rx,
        })
    }

    /// Start the first balance batch, subscribe to the watch list and, when
    /// configured, connect the selected wallet. Both the batch and the
    /// subscriptions complete on the event loop.
    pub async fn start(&mut self) {
        tracing::info!(
            network = %self.selector.network(),
            endpoint = %self.connection.endpoint,
            watched = self.watcher.addresses().len(),
            "starting"
        );
        self.started = true;
        self.fetch_watch_list();
        self.wire_subscriptions(self.watcher.addresses().to_vec(), 0);

        if self.config.auto_connect && !self.wallets.is_empty() {
            if let Err(e) = self.connect_wallet(None).await {
                tracing::warn!(error = %e, "auto-connect failed");
            }
        }
    }

    // ── Network ──────────────────────────────────────────────────────────

    /// Switch networks. When the endpoint changes, every subscription on the
    /// old connection is released, the new connection is subscribed and all
    /// balances are fetched again. Before [`App::start`] only the connection
    /// is swapped. Returns whether the endpoint changed.
    pub fn select_network(&mut self, network: Network) -> Result<bool, AppError> {
        let endpoint = Endpoint::for_network(network, &self.config.endpoint_overrides());
        if endpoint == self.connection.endpoint {
            self.selector.select(network);
            return Ok(false);
        }

        let connection = self.connector.connect(&endpoint)?;
        self.selector.select(network);

        let old = std::mem::replace(&mut self.connection, connection);
        let stale = self.watcher.take_subscriptions();
        tracing::debug!(
            subscriptions = stale.len(),
            old = %old.endpoint,
            "releasing subscriptions"
        );
        self.release(old.pubsub, stale);

        let (log_tx, log_rx) = mpsc::unbounded_channel();
        self.log_tx = log_tx;
        self.log_rx = log_rx;
        self.generation += 1;

        if self.started {
            self.fetch_watch_list();
            self.wire_subscriptions(self.watcher.addresses().to_vec(), 0);
        }
        if let Some(action) = self.session.endpoint_changed() {
            self.perform(action);
        }
        Ok(true)
    }

    pub fn network(&self) -> Network {
        self.selector.network()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.connection.endpoint
    }

    // ── Watcher ──────────────────────────────────────────────────────────

    /// Start a balance batch for the whole watch list, superseding any batch
    /// still in flight.
    pub fn fetch_watch_list(&mut self) {
        let ticket = self.watcher.begin_batch();
        let rpc = self.connection.rpc.clone();
        let addresses = self.watcher.addresses().to_vec();
        let commitment = self.config.commitment;
        self.tasks.spawn(async move {
            let results = fetch_all(rpc.as_ref(), &addresses, commitment).await;
            TaskOutput::Batch { ticket, results }
        });
    }

    pub fn watcher(&self) -> &Watcher {
        &self.watcher
    }

    /// Subscribe `addresses` on the active connection. Attempt 0 starts at
    /// once; resubscribe attempts wait for their backoff first.
    fn wire_subscriptions(&mut self, addresses: Vec<Pubkey>, attempt: u32) {
        let pubsub = self.connection.pubsub.clone();
        let sink = self.log_tx.clone();
        let generation = self.generation;
        let timeout = self.config.subscribe_timeout();
        let delay = match attempt {
            0 => Duration::ZERO,
            n => resubscribe_delay(n),
        };
        self.tasks.spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let wiring = subscribe_all(pubsub.as_ref(), &addresses, &sink, timeout).await;
            TaskOutput::Subscribed {
                generation,
                attempt,
                pubsub,
                wiring,
            }
        });
    }

    fn release(
        &mut self,
        pubsub: Arc<dyn LogSubscriber>,
        subscriptions: Vec<(Pubkey, SubscriptionId)>,
    ) {
        if subscriptions.is_empty() {
            return;
        }
        let timeout = self.config.subscribe_timeout();
        self.releases
            .spawn(async move { release_all(pubsub.as_ref(), subscriptions, timeout).await });
    }

    // ── Wallet ───────────────────────────────────────────────────────────

    /// Connect the wallet called `name`, or the selected one when `None`.
    pub async fn connect_wallet(&mut self, name: Option<&str>) -> Result<Pubkey, AppError> {
        let adapter = match name {
            Some(name) => self.wallets.select(name)?,
            None => self.wallets.selected().ok_or(WalletError::NoneSelected)?,
        };
        if self.wallet.is_some() {
            self.disconnect_wallet().await?;
        }
        let owner = adapter.connect().await?;
        tracing::info!(wallet = adapter.name(), %owner, "wallet connected");
        self.wallet = Some(adapter);
        let action = self.session.wallet_connected(owner);
        self.perform(action);
        Ok(owner)
    }

    pub async fn disconnect_wallet(&mut self) -> Result<(), AppError> {
        let Some(adapter) = self.wallet.take() else {
            return Ok(());
        };
        self.session.wallet_disconnected();
        adapter.disconnect().await?;
        tracing::info!(wallet = adapter.name(), "wallet disconnected");
        Ok(())
    }

    pub fn wallets(&self) -> &WalletRegistry {
        &self.wallets
    }

    pub fn wallet_name(&self) -> Option<&str> {
        self.wallet.as_deref().map(|w| w.name())
    }

    // ── Session ──────────────────────────────────────────────────────────

    pub fn refresh(&mut self) -> RefreshOutcome {
        let outcome = self.session.refresh(Instant::now());
        if let RefreshOutcome::Started(action) = &outcome {
            self.perform(action.clone());
        }
        outcome
    }

    pub fn set_recipient(&mut self, recipient: impl Into<String>) {
        self.session.set_recipient(recipient);
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.session.set_amount(amount);
    }

    pub fn submit_transfer(&mut self) -> Result<(), SessionError> {
        let action = self.session.submit()?;
        self.perform(action);
        Ok(())
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    fn perform(&mut self, action: SessionAction) {
        match action {
            SessionAction::FetchBalance { owner } => {
                let rpc = self.connection.rpc.clone();
                let generation = self.generation;
                let commitment = self.config.commitment;
                self.tasks.spawn(async move {
                    let result = rpc.get_balance(&owner, commitment).await;
                    if let Err(e) = &result {
                        tracing::warn!(%owner, error = %e, "wallet balance query failed");
                    }
                    TaskOutput::SessionBalance {
                        generation,
                        owner,
                        result: BalanceState::from_result(&result),
                    }
                });
            }
            SessionAction::Transfer(request) => match self.wallet.clone() {
                Some(wallet) => {
                    let rpc = self.connection.rpc.clone();
                    let commitment = self.config.commitment;
                    self.tasks.spawn(async move {
                        let result = transfer(rpc, wallet, request, commitment)
                            .await
                            .map_err(|e| e.to_string());
                        TaskOutput::Transfer { result }
                    });
                }
                None => {
                    let now = Instant::now();
                    self.session.transfer_finished(Err("no wallet connected".into()), now);
                }
            },
        }
    }

    // ── Event loop ───────────────────────────────────────────────────────

    /// Wait for the next task completion, pubsub event or session deadline
    /// and apply it.
    pub async fn next_event(&mut self) -> AppEvent {
        loop {
            let deadline = self.session.next_deadline();
            tokio::select! {
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    match joined {
                        Ok(output) => {
                            if let Some(event) = self.apply(output) {
                                return event;
                            }
                        }
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => tracing::warn!(error = %e, "task failed"),
                    }
                }
                Some(released) = self.releases.join_next(), if !self.releases.is_empty() => {
                    reaped(released);
                }
                Some(event) = self.log_rx.recv() => {
                    if let Some(event) = self.apply_pubsub(event) {
                        return event;
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.session.tick(Instant::now());
                    return AppEvent::DeadlineReached;
                }
            }
        }
    }

    /// Apply events until no task is in flight and no pubsub event is
    /// queued. Pending deadlines are left alone.
    pub async fn run_until_idle(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        loop {
            while let Ok(event) = self.log_rx.try_recv() {
                events.extend(self.apply_pubsub(event));
            }
            if self.tasks.is_empty() && self.releases.is_empty() {
                break;
            }
            let deadline = self.session.next_deadline();
            tokio::select! {
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => match joined {
                    Ok(output) => events.extend(self.apply(output)),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => tracing::warn!(error = %e, "task failed"),
                },
                Some(released) = self.releases.join_next(), if !self.releases.is_empty() => {
                    reaped(released);
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.session.tick(Instant::now());
                    events.push(AppEvent::DeadlineReached);
                }
            }
        }
        events
    }

    fn apply(&mut self, output: TaskOutput) -> Option<AppEvent> {
        match output {
            TaskOutput::Batch { ticket, results } => {
                let loaded = results.iter().filter(|s| s.lamports().is_some()).count();
                let failed = results.len() - loaded;
                self.watcher
                    .finish_batch(ticket, results)
                    .then_some(AppEvent::BalancesUpdated { loaded, failed })
            }
            TaskOutput::Subscribed {
                generation,
                attempt,
                pubsub,
                wiring,
            } => {
                if generation != self.generation {
                    tracing::debug!(
                        opened = wiring.opened.len(),
                        "releasing subscriptions opened on a previous endpoint"
                    );
                    self.release(pubsub, wiring.opened);
                    return None;
                }
                let opened = wiring.opened.len();
                let failed = wiring.failed.clone();
                let dropped = self.watcher.record_wiring(wiring);
                if !dropped.is_empty() {
                    self.wire_subscriptions(dropped, 1);
                }
                if attempt > 0 && !failed.is_empty() {
                    if attempt < RESUBSCRIBE_ATTEMPTS {
                        self.wire_subscriptions(failed.clone(), attempt + 1);
                    } else {
                        tracing::warn!(
                            addresses = failed.len(),
                            attempts = attempt,
                            "giving up on resubscribing"
                        );
                    }
                }
                Some(AppEvent::SubscriptionsWired {
                    opened,
                    failed: failed.len(),
                })
            }
            TaskOutput::SessionBalance {
                generation,
                owner,
                result,
            } => {
                if generation != self.generation {
                    tracing::debug!(%owner, "discarding balance from a previous endpoint");
                    return None;
                }
                self.session.balance_fetched(owner, result.clone());
                Some(AppEvent::SessionBalance(result))
            }
            TaskOutput::Transfer { result } => {
                let follow_up = self.session.transfer_finished(result.clone(), Instant::now());
                if let Some(action) = follow_up {
                    self.perform(action);
                }
                Some(match result {
                    Ok(signature) => {
                        tracing::info!(%signature, "transfer confirmed");
                        AppEvent::TransferSucceeded(signature)
                    }
                    Err(reason) => AppEvent::TransferFailed(reason),
                })
            }
        }
    }

    fn apply_pubsub(&mut self, event: PubsubEvent) -> Option<AppEvent> {
        match event {
            PubsubEvent::Log(event) => {
                self.watcher.record_log(&event);
                Some(AppEvent::Notification(NotificationLog::format(
                    &event.address,
                    &event.signature,
                )))
            }
            PubsubEvent::Dropped {
                subscription,
                address,
            } => {
                tracing::warn!(%address, %subscription, "log subscription dropped by server");
                if self.watcher.subscription_dropped(subscription) {
                    self.wire_subscriptions(vec![address], 1);
                }
                Some(AppEvent::SubscriptionDropped(address))
            }
        }
    }

    /// Release every subscription and abort in-flight work. Returns the
    /// number of subscriptions released.
    pub async fn shutdown(&mut self) -> usize {
        let timeout = self.config.subscribe_timeout();
        self.tasks.abort_all();
        let mut released = 0;
        while let Some(joined) = self.tasks.join_next().await {
            // Wiring that completed but was never applied still holds live
            // subscriptions.
            if let Ok(TaskOutput::Subscribed { pubsub, wiring, .. }) = joined {
                released += release_all(pubsub.as_ref(), wiring.opened, timeout).await;
            }
        }
        while let Some(joined) = self.releases.join_next().await {
            reaped(joined);
        }
        let current = self.watcher.take_subscriptions();
        released += release_all(self.connection.pubsub.as_ref(), current, timeout).await;
        tracing::info!(released, "shut down");
        released
    }
}

fn reaped(released: Result<usize, JoinError>) {
    match released {
        Ok(count) => tracing::debug!(count, "released subscriptions on a previous endpoint"),
        Err(e) if e.is_cancelled() => {}
        Err(e) => tracing::warn!(error = %e, "release task failed"),
    }
}

/// Build, sign, submit and confirm one transfer.
async fn transfer(
    rpc: Arc<dyn ChainClient>,
    wallet: Arc<dyn WalletAdapter>,
    request: TransferRequest,
    commitment: Commitment,
) -> Result<Signature, WalletError> {
    let transaction = build_transfer(
        rpc.as_ref(),
        &request.from,
        &request.to,
        request.lamports,
        commitment,
    )
    .await?;
    let signature = wallet
        .send_transaction(transaction, rpc.as_ref(), commitment)
        .await?;
    tracing::info!(%signature, to = %request.to, amount = %request.lamports, "transfer submitted");
    rpc.confirm_transaction(&signature, commitment).await?;
    Ok(signature)
}
