//! solwatch runtime.
//!
//! Wires three components to the active cluster connection:
//! - the network selector (which cluster, persisted between runs)
//! - the watcher (balances and transaction notifications for a fixed list)
//! - the wallet session (connected wallet balance, refresh, transfers)
//!
//! Front ends drive an [`App`] by calling its operations and awaiting
//! [`App::next_event`].

pub mod app;
pub mod balance;
pub mod config;
pub mod connection;
pub mod error;
pub mod network_selector;
pub mod notifications;
pub mod session;
pub mod shutdown;
pub mod watcher;

pub use app::{App, AppEvent};
pub use balance::{BalanceError, BalanceState};
pub use config::{AppConfig, WalletConfig};
pub use connection::{Connection, Connector, HttpConnector};
pub use error::AppError;
pub use network_selector::NetworkSelector;
pub use notifications::NotificationLog;
pub use session::{
    RefreshOutcome, SessionAction, SessionError, SessionStatus, TransferRequest, WalletSession,
};
pub use shutdown::{ShutdownController, ShutdownSignal};
pub use watcher::{
    fetch_all, release_all, subscribe_all, BatchTicket, Watcher, Wiring, RESUBSCRIBE_ATTEMPTS,
    RESUBSCRIBE_DELAY,
};
