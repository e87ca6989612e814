//! End-to-end tests of the runtime against nullable chains.
//!
//! Each endpoint gets its own `NullChain`, so tests can check which cluster
//! a query or subscription went to. Time is paused, which makes cooldowns
//! and notice expiry deterministic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use solwatch_app::{
    App, AppConfig, AppError, AppEvent, BalanceError, BalanceState, Connection, Connector,
    NetworkSelector, RefreshOutcome, SessionError, SessionStatus, RESUBSCRIBE_ATTEMPTS,
};
use solwatch_nullables::{NullChain, NullPreferenceStore, NullWallet};
use solwatch_rpc::RpcError;
use solwatch_store::NETWORK_KEY;
use solwatch_types::{Endpoint, Lamports, Network, Pubkey, Signature, LAMPORTS_PER_SOL};
use solwatch_wallet_core::{WalletAdapter, WalletRegistry};
use tokio::time::Instant;

const DEVNET: &str = "https://api.devnet.solana.com";
const TESTNET: &str = "https://api.testnet.solana.com";
const MAINNET_OVERRIDE: &str = "https://rpc.example.com";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Hands out one shared `NullChain` per HTTP URL.
#[derive(Default)]
struct ClusterConnector {
    chains: Mutex<HashMap<String, NullChain>>,
}

impl ClusterConnector {
    fn chain(&self, http: &str) -> NullChain {
        self.chains
            .lock()
            .unwrap()
            .entry(http.to_string())
            .or_default()
            .clone()
    }
}

impl Connector for ClusterConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Connection, AppError> {
        let chain = self.chain(&endpoint.http);
        Ok(Connection {
            endpoint: endpoint.clone(),
            rpc: Arc::new(chain.clone()),
            pubsub: Arc::new(chain),
        })
    }
}

struct Harness {
    app: App,
    connector: Arc<ClusterConnector>,
    store: Arc<NullPreferenceStore>,
    wallet: Arc<NullWallet>,
}

impl Harness {
    fn devnet(&self) -> NullChain {
        self.connector.chain(DEVNET)
    }
}

fn watched(n: u8) -> Vec<Pubkey> {
    (1..=n).map(|i| Pubkey::new([i; 32])).collect()
}

fn owner() -> Pubkey {
    Pubkey::new([42; 32])
}

fn recipient() -> Pubkey {
    Pubkey::new([43; 32])
}

fn sol(n: u64) -> Lamports {
    Lamports::new(n * LAMPORTS_PER_SOL)
}

fn config(auto_connect: bool) -> AppConfig {
    AppConfig {
        watch_list: watched(3),
        mainnet_endpoint: Some(MAINNET_OVERRIDE.to_string()),
        auto_connect,
        ..AppConfig::default()
    }
}

fn harness_with(config: AppConfig, store: NullPreferenceStore) -> Harness {
    let connector = Arc::new(ClusterConnector::default());
    let store = Arc::new(store);
    let wallet = Arc::new(NullWallet::new("Null", owner()));
    let mut wallets = WalletRegistry::new();
    wallets.register(wallet.clone());

    let app = App::new(config, store.clone(), connector.clone(), wallets).expect("app");
    Harness {
        app,
        connector,
        store,
        wallet,
    }
}

fn harness(auto_connect: bool) -> Harness {
    harness_with(config(auto_connect), NullPreferenceStore::new())
}

// ---------------------------------------------------------------------------
// Watcher
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn batch_settles_every_watched_address() {
    let mut h = harness(false);
    let chain = h.devnet();
    let addresses = watched(3);
    chain.set_balance(addresses[0], sol(1));
    chain.fail_balance(addresses[1], RpcError::Transport("connection reset".into()));

    h.app.start().await;
    assert!(h.app.watcher().loading());
    let events = h.app.run_until_idle().await;

    assert!(events.contains(&AppEvent::BalancesUpdated { loaded: 2, failed: 1 }));
    assert!(!h.app.watcher().loading());
    assert!(h.app.watcher().balances().all(|(_, state)| state.is_settled()));
    assert_eq!(h.app.watcher().balance_of(&addresses[0]), Some(&BalanceState::Loaded(sol(1))));
    assert_eq!(
        h.app.watcher().balance_of(&addresses[1]),
        Some(&BalanceState::Failed(BalanceError::FetchFailed))
    );
    assert_eq!(chain.balance_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn log_notifications_are_recorded_in_order() {
    let mut h = harness(false);
    let chain = h.devnet();
    h.app.start().await;
    h.app.run_until_idle().await;
    assert_eq!(chain.active_subscriptions(), 3);

    let address = watched(3)[2];
    let first = Signature::new([5; 64]);
    let second = Signature::new([6; 64]);
    assert_eq!(chain.emit_log(&address, first), 1);
    assert_eq!(chain.emit_log(&address, first), 1);
    assert_eq!(chain.emit_log(&address, second), 1);

    let expected = format!("New transaction detected on wallet {address}: signature {first}");
    assert_eq!(h.app.next_event().await, AppEvent::Notification(expected.clone()));
    h.app.run_until_idle().await;

    let log: Vec<_> = h.app.watcher().notifications().iter().collect();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0], expected);
    assert_eq!(log[1], expected);
    assert!(log[2].ends_with(&second.to_string()));
}

#[tokio::test(start_paused = true)]
async fn notification_limit_drops_oldest() {
    let config = AppConfig {
        notification_limit: Some(2),
        ..config(false)
    };
    let mut h = harness_with(config, NullPreferenceStore::new());
    let chain = h.devnet();
    h.app.start().await;
    h.app.run_until_idle().await;

    let address = watched(1)[0];
    for byte in 1..=3 {
        chain.emit_log(&address, Signature::new([byte; 64]));
    }
    h.app.run_until_idle().await;

    let notifications = h.app.watcher().notifications();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications.dropped(), 1);
    assert!(notifications
        .iter()
        .all(|entry| !entry.ends_with(&Signature::new([1; 64]).to_string())));
}

#[tokio::test(start_paused = true)]
async fn failed_subscription_is_counted_and_others_still_subscribe() {
    let mut h = harness(false);
    let chain = h.devnet();
    chain.fail_subscribe(watched(3)[1]);

    h.app.start().await;
    let events = h.app.run_until_idle().await;
    assert!(events.contains(&AppEvent::SubscriptionsWired { opened: 2, failed: 1 }));
    assert_eq!(chain.active_subscriptions(), 2);
    assert_eq!(h.app.watcher().subscription_failures(), 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_websocket_does_not_hold_up_balances() {
    let mut h = harness(false);
    let chain = h.devnet();
    chain.stall_subscriptions();
    chain.set_balance(watched(3)[0], sol(2));
    let subscribe_timeout = AppConfig::default().subscribe_timeout();

    let started = Instant::now();
    h.app.start().await;
    assert_eq!(
        h.app.next_event().await,
        AppEvent::BalancesUpdated { loaded: 3, failed: 0 }
    );
    assert_eq!(chain.balance_calls(), 3);
    assert!(started.elapsed() < subscribe_timeout);

    // The hung subscriptions time out and count as failures.
    let events = h.app.run_until_idle().await;
    assert!(events.contains(&AppEvent::SubscriptionsWired { opened: 0, failed: 3 }));
    assert_eq!(h.app.watcher().subscription_failures(), 3);

    // Switching networks does not wait on the hung socket.
    assert!(h.app.select_network(Network::Testnet).unwrap());
    let events = h.app.run_until_idle().await;
    assert!(events.contains(&AppEvent::SubscriptionsWired { opened: 3, failed: 0 }));
    assert_eq!(h.connector.chain(TESTNET).active_subscriptions(), 3);
    assert_eq!(h.app.watcher().subscription_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn dropped_socket_is_resubscribed_and_notifications_resume() {
    let mut h = harness(false);
    let chain = h.devnet();
    h.app.start().await;
    h.app.run_until_idle().await;
    assert_eq!(h.app.watcher().subscription_count(), 3);

    assert_eq!(chain.drop_connection(), 3);
    let address = watched(3)[0];
    assert_eq!(chain.emit_log(&address, Signature::new([7; 64])), 0);

    let events = h.app.run_until_idle().await;
    for dropped in watched(3) {
        assert!(events.contains(&AppEvent::SubscriptionDropped(dropped)));
    }
    assert_eq!(chain.subscriptions_opened(), 6);
    assert_eq!(chain.active_subscriptions(), 3);
    assert_eq!(h.app.watcher().subscription_count(), 3);

    let signature = Signature::new([8; 64]);
    assert_eq!(chain.emit_log(&address, signature), 1);
    let expected = format!("New transaction detected on wallet {address}: signature {signature}");
    assert_eq!(h.app.next_event().await, AppEvent::Notification(expected));
}

#[tokio::test(start_paused = true)]
async fn resubscribing_gives_up_after_repeated_failures() {
    let mut h = harness(false);
    let chain = h.devnet();
    h.app.start().await;
    h.app.run_until_idle().await;

    chain.fail_subscribe(watched(3)[1]);
    chain.drop_connection();
    let dropped_at = Instant::now();
    h.app.run_until_idle().await;

    assert_eq!(
        h.app.watcher().subscription_failures(),
        RESUBSCRIBE_ATTEMPTS as usize
    );
    assert_eq!(h.app.watcher().subscription_count(), 2);
    assert_eq!(chain.active_subscriptions(), 2);
    // Backoff of 1, 2, 4, 8 and 16 seconds.
    assert!(dropped_at.elapsed() >= Duration::from_secs(31));
}

// ---------------------------------------------------------------------------
// Network selection
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn empty_storage_starts_on_devnet() {
    let mut h = harness(false);
    h.app.start().await;
    h.app.run_until_idle().await;
    assert_eq!(h.app.network(), Network::Devnet);
    assert_eq!(h.app.endpoint().http, DEVNET);
    assert_eq!(h.devnet().subscriptions_opened(), 3);
}

#[tokio::test(start_paused = true)]
async fn stored_network_is_restored() {
    let h = harness_with(config(false), NullPreferenceStore::new().with(NETWORK_KEY, "testnet"));
    assert_eq!(h.app.network(), Network::Testnet);
    assert_eq!(h.app.endpoint().http, TESTNET);
}

#[tokio::test(start_paused = true)]
async fn network_change_persists_and_rewires_everything() {
    let mut h = harness(true);
    let devnet = h.devnet();
    let testnet = h.connector.chain(TESTNET);
    testnet.set_balance(owner(), sol(3));

    h.app.start().await;
    h.app.run_until_idle().await;

    assert!(h.app.select_network(Network::Testnet).unwrap());
    assert_eq!(h.store.value(NETWORK_KEY).as_deref(), Some("testnet"));
    assert_eq!(h.app.endpoint().http, TESTNET);

    h.app.run_until_idle().await;
    assert_eq!(devnet.subscriptions_released(), devnet.subscriptions_opened());
    assert_eq!(devnet.active_subscriptions(), 0);
    assert_eq!(testnet.active_subscriptions(), 3);
    assert_eq!(testnet.balance_calls(), 4);
    assert_eq!(h.app.session().balance(), &BalanceState::Loaded(sol(3)));

    // Old subscriptions no longer deliver.
    assert_eq!(devnet.emit_log(&watched(1)[0], Signature::new([1; 64])), 0);

    let restored = NetworkSelector::load(h.store.clone(), Default::default(), Network::Devnet);
    assert_eq!(restored.network(), Network::Testnet);
}

#[tokio::test(start_paused = true)]
async fn reselecting_the_same_network_keeps_the_connection() {
    let mut h = harness(false);
    h.app.start().await;
    assert!(!h.app.select_network(Network::Devnet).unwrap());
    assert_eq!(h.devnet().subscriptions_released(), 0);
    assert_eq!(h.store.writes(), 1);
}

#[tokio::test(start_paused = true)]
async fn mainnet_uses_configured_override() {
    let mut h = harness(false);
    h.app.start().await;
    h.app.select_network(Network::Mainnet).unwrap();
    h.app.run_until_idle().await;

    assert_eq!(h.app.endpoint().http, MAINNET_OVERRIDE);
    assert_eq!(h.app.endpoint().websocket, "wss://rpc.example.com");
    assert_eq!(h.connector.chain(MAINNET_OVERRIDE).active_subscriptions(), 3);
    assert_eq!(h.store.value(NETWORK_KEY).as_deref(), Some("mainnet-beta"));
}

#[tokio::test(start_paused = true)]
async fn balance_from_previous_endpoint_is_discarded() {
    let mut h = harness(false);
    let devnet = h.devnet();
    devnet.set_balance(owner(), sol(1));
    devnet.set_latency(Duration::from_secs(1));
    h.connector.chain(TESTNET).set_balance(owner(), sol(2));

    h.app.start().await;
    h.app.connect_wallet(None).await.unwrap();
    h.app.select_network(Network::Testnet).unwrap();
    h.app.run_until_idle().await;

    assert_eq!(h.app.session().balance(), &BalanceState::Loaded(sol(2)));
    assert!(h.app.watcher().balances().all(|(_, state)| state.is_settled()));
}

// ---------------------------------------------------------------------------
// Wallet session
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn auto_connect_fetches_wallet_balance() {
    let mut h = harness(true);
    h.devnet().set_balance(owner(), sol(4));
    h.app.start().await;

    assert_eq!(h.app.wallet_name(), Some("Null"));
    assert_eq!(h.app.session().status(Instant::now()), SessionStatus::FetchingBalance);
    let events = h.app.run_until_idle().await;

    assert!(events.contains(&AppEvent::SessionBalance(BalanceState::Loaded(sol(4)))));
    assert_eq!(h.app.session().status(Instant::now()), SessionStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn refresh_during_cooldown_issues_no_query() {
    let mut h = harness(true);
    let chain = h.devnet();
    h.app.start().await;
    h.app.run_until_idle().await;
    assert_eq!(chain.balance_calls_for(&owner()), 1);

    assert!(matches!(h.app.refresh(), RefreshOutcome::Started(_)));
    h.app.run_until_idle().await;
    assert_eq!(chain.balance_calls_for(&owner()), 2);

    for _ in 0..3 {
        assert!(matches!(h.app.refresh(), RefreshOutcome::CoolingDown { .. }));
    }
    h.app.run_until_idle().await;
    assert_eq!(chain.balance_calls_for(&owner()), 2);
    assert_eq!(h.app.session().refresh_label(Instant::now()), "Wait...");

    assert_eq!(h.app.next_event().await, AppEvent::DeadlineReached);
    assert_eq!(h.app.session().status(Instant::now()), SessionStatus::Idle);
    assert!(matches!(h.app.refresh(), RefreshOutcome::Started(_)));
    h.app.run_until_idle().await;
    assert_eq!(chain.balance_calls_for(&owner()), 3);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_balance_shows_rate_limit_message() {
    let mut h = harness(true);
    h.devnet().fail_balance(
        owner(),
        RpcError::HttpStatus {
            status: 429,
            body: "Too Many Requests".into(),
        },
    );
    h.app.start().await;
    h.app.run_until_idle().await;

    let error = h.app.session().error().expect("error shown");
    assert_eq!(
        error.to_string(),
        "Too many requests. Please wait a few seconds and try again."
    );
}

#[tokio::test(start_paused = true)]
async fn successful_send_clears_inputs_and_refreshes_once() {
    let mut h = harness(true);
    let chain = h.devnet();
    chain.set_balance(owner(), sol(10));
    h.app.start().await;
    h.app.run_until_idle().await;
    let calls_before = chain.balance_calls_for(&owner());

    h.app.set_recipient(recipient().to_string());
    h.app.set_amount("1.5");
    h.app.submit_transfer().unwrap();
    assert_eq!(h.app.session().send_label(), "Sending...");
    let sent_at = Instant::now();

    let events = h.app.run_until_idle().await;
    let signature = Signature::new([1; 64]);
    assert!(events.contains(&AppEvent::TransferSucceeded(signature)));
    assert_eq!(chain.confirmed(), vec![signature]);
    assert_eq!(chain.sent_transactions().len(), 1);
    assert_eq!(h.wallet.signed().len(), 1);

    assert_eq!(chain.balance_calls_for(&owner()), calls_before + 1);
    assert_eq!(h.app.session().recipient(), "");
    assert_eq!(h.app.session().amount(), "");
    assert_eq!(
        h.app.session().notice().map(|n| n.text.as_str()),
        Some("✅ Transaction successful!")
    );
    assert_eq!(h.app.session().last_signature(), Some(signature));

    assert_eq!(h.app.next_event().await, AppEvent::DeadlineReached);
    assert!(h.app.session().notice().is_none());
    assert!(Instant::now() - sent_at >= Duration::from_secs(5));
    assert_eq!(chain.balance_calls_for(&owner()), calls_before + 1);
}

#[tokio::test(start_paused = true)]
async fn failed_send_keeps_inputs_and_skips_refresh() {
    let mut h = harness(true);
    let chain = h.devnet();
    chain.set_balance(owner(), sol(10));
    h.wallet.reject_with("user rejected the request");
    h.app.start().await;
    h.app.run_until_idle().await;
    let calls_before = chain.balance_calls_for(&owner());

    h.app.set_recipient(recipient().to_string());
    h.app.set_amount("2");
    h.app.submit_transfer().unwrap();
    let events = h.app.run_until_idle().await;

    assert!(events
        .iter()
        .any(|e| matches!(e, AppEvent::TransferFailed(r) if r.contains("user rejected"))));
    assert_eq!(h.app.session().recipient(), recipient().to_string());
    assert_eq!(h.app.session().amount(), "2");
    assert_eq!(h.app.session().error(), Some(&SessionError::SendFailed));
    assert_eq!(
        h.app.session().error().unwrap().to_string(),
        "Failed to send transaction. Please try again."
    );
    assert!(h.app.session().notice().is_none());
    assert_eq!(chain.balance_calls_for(&owner()), calls_before);
    assert!(chain.sent_transactions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_transfer_is_reported_as_failure() {
    let mut h = harness(true);
    let chain = h.devnet();
    chain.set_balance(owner(), sol(10));
    chain.fail_confirm(RpcError::ConfirmationTimeout(Signature::new([1; 64])));
    h.app.start().await;
    h.app.run_until_idle().await;

    h.app.set_recipient(recipient().to_string());
    h.app.set_amount("1");
    h.app.submit_transfer().unwrap();
    h.app.run_until_idle().await;

    assert_eq!(h.app.session().error(), Some(&SessionError::SendFailed));
    assert_eq!(h.app.session().amount(), "1");
}

#[tokio::test(start_paused = true)]
async fn invalid_transfer_never_reaches_the_wallet() {
    let mut h = harness(true);
    h.devnet().set_balance(owner(), sol(1));
    h.app.start().await;
    h.app.run_until_idle().await;

    h.app.set_recipient(recipient().to_string());
    h.app.set_amount("5");
    assert!(matches!(
        h.app.submit_transfer(),
        Err(SessionError::InsufficientBalance { .. })
    ));
    assert!(h.app.run_until_idle().await.is_empty());
    assert!(h.wallet.signed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn transfer_without_wallet_is_rejected() {
    let mut h = harness(false);
    h.app.start().await;
    h.app.set_recipient(recipient().to_string());
    h.app.set_amount("1");
    assert_eq!(h.app.submit_transfer(), Err(SessionError::NotConnected));
}

#[tokio::test(start_paused = true)]
async fn disconnect_resets_the_session() {
    let mut h = harness(true);
    h.app.start().await;
    h.app.run_until_idle().await;

    h.app.disconnect_wallet().await.unwrap();
    assert_eq!(h.app.wallet_name(), None);
    assert_eq!(h.app.session().status(Instant::now()), SessionStatus::Disconnected);
    assert!(h.wallet.public_key().is_none());
    assert!(matches!(h.app.refresh(), RefreshOutcome::NotConnected));
}

#[tokio::test(start_paused = true)]
async fn unknown_wallet_name_is_an_error() {
    let mut h = harness(false);
    let err = h.app.connect_wallet(Some("Phantom")).await.unwrap_err();
    assert!(matches!(err, AppError::Wallet(_)));
    assert_eq!(h.app.wallet_name(), None);
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn shutdown_releases_every_subscription() {
    let mut h = harness(true);
    let devnet = h.devnet();
    let testnet = h.connector.chain(TESTNET);
    h.app.start().await;
    h.app.run_until_idle().await;

    // Leave a balance batch in flight on the new endpoint.
    testnet.set_latency(Duration::from_secs(30));
    h.app.select_network(Network::Testnet).unwrap();
    loop {
        if let AppEvent::SubscriptionsWired { .. } = h.app.next_event().await {
            break;
        }
    }
    let released = h.app.shutdown().await;

    assert_eq!(released, 3);
    for chain in [&devnet, &testnet] {
        assert_eq!(chain.subscriptions_released(), chain.subscriptions_opened());
        assert_eq!(chain.active_subscriptions(), 0);
    }
    assert!(h.app.run_until_idle().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn selecting_before_start_defers_wiring() {
    let mut h = harness(false);
    let testnet = h.connector.chain(TESTNET);

    assert!(h.app.select_network(Network::Testnet).unwrap());
    assert_eq!(testnet.subscriptions_opened(), 0);
    assert!(h.app.run_until_idle().await.is_empty());

    h.app.start().await;
    h.app.run_until_idle().await;
    assert_eq!(testnet.active_subscriptions(), 3);
    assert_eq!(h.devnet().subscriptions_opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn selection_survives_restart_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.toml");
    let connector = Arc::new(ClusterConnector::default());

    let store = Arc::new(solwatch_store::FilePreferenceStore::open(&path));
    let mut app = App::new(config(false), store, connector.clone(), WalletRegistry::new()).unwrap();
    app.start().await;
    app.select_network(Network::Mainnet).unwrap();
    app.shutdown().await;

    let store = Arc::new(solwatch_store::FilePreferenceStore::open(&path));
    let app = App::new(config(false), store, connector, WalletRegistry::new()).unwrap();
    assert_eq!(app.network(), Network::Mainnet);
    assert_eq!(app.endpoint().http, MAINNET_OVERRIDE);
}
