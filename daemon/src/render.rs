//! Text rendering of the runtime state for the terminal.

use std::fmt::Write;

use solwatch_app::session::SEND_SUCCESS_MESSAGE;
use solwatch_app::{App, AppEvent, RefreshOutcome, SessionError, Watcher};
use solwatch_types::Network;
use solwatch_utils::format_duration;
use tokio::time::Instant;

pub fn header(app: &App) -> String {
    let network = app.network();
    format!(
        "{} {} [{}] {}",
        network.icon(),
        network.label(),
        network.badge(),
        app.endpoint()
    )
}

pub fn networks(current: Network) -> String {
    let mut out = String::new();
    for network in Network::ALL {
        let marker = if network == current { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {} {:<8} {:<13} {}",
            network.icon(),
            network.label(),
            network.as_str(),
            network.tooltip()
        );
    }
    out
}

pub fn balances(watcher: &Watcher) -> String {
    let mut out = String::new();
    if watcher.loading() {
        out.push_str("Loading balances...\n");
    }
    for (address, state) in watcher.balances() {
        let _ = writeln!(out, "{address}  {state}");
    }
    out
}

pub fn notifications(watcher: &Watcher) -> String {
    let log = watcher.notifications();
    if log.is_empty() {
        return "No transactions detected yet.\n".to_string();
    }
    let mut out = String::new();
    for entry in log.iter() {
        let _ = writeln!(out, "{entry}");
    }
    if log.dropped() > 0 {
        let _ = writeln!(out, "({} older notifications dropped)", log.dropped());
    }
    out
}

pub fn wallets(app: &App) -> String {
    let names = app.wallets().names();
    if names.is_empty() {
        return "No wallets configured.\n".to_string();
    }
    let mut out = String::new();
    for name in names {
        let marker = if app.wallet_name() == Some(name) { "*" } else { " " };
        let _ = writeln!(out, "{marker} {name}");
    }
    out
}

pub fn session(app: &App, now: Instant) -> String {
    let session = app.session();
    let Some(owner) = session.owner() else {
        return "Wallet: not connected (use `connect`)\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(out, "Wallet: {} ({owner})", app.wallet_name().unwrap_or("?"));
    let _ = writeln!(out, "Balance: {}", session.balance());
    let _ = writeln!(out, "[{}]  [{}]", session.refresh_label(now), session.send_label());
    if !session.recipient().is_empty() || !session.amount().is_empty() {
        let _ = writeln!(out, "Transfer: {} SOL to {}", session.amount(), session.recipient());
    }
    if let Some(error) = session.error() {
        let _ = writeln!(out, "Error: {error}");
    }
    if let Some(notice) = session.notice() {
        let _ = writeln!(out, "{}", notice.text);
    }
    if let Some(signature) = session.last_signature() {
        let _ = writeln!(out, "Last transfer: {signature}");
    }
    out
}

pub fn refresh(outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Started(_) => "Refreshing...".to_string(),
        RefreshOutcome::CoolingDown { remaining } => {
            format!("Wait {} before refreshing again.", format_duration(*remaining))
        }
        RefreshOutcome::AlreadyLoading => "Already refreshing.".to_string(),
        RefreshOutcome::NotConnected => SessionError::NotConnected.to_string(),
    }
}

/// Line printed for an event, if it deserves one.
pub fn event(app: &App, event: &AppEvent) -> Option<String> {
    match event {
        AppEvent::Notification(text) => Some(text.clone()),
        AppEvent::BalancesUpdated { loaded, failed } => Some(format!(
            "Balances updated: {loaded} loaded, {failed} failed"
        )),
        AppEvent::SubscriptionsWired { opened, failed } => Some(format!(
            "Subscriptions: {opened} opened, {failed} failed"
        )),
        AppEvent::SubscriptionDropped(address) => Some(format!(
            "Subscription for {address} dropped by the server, resubscribing"
        )),
        AppEvent::SessionBalance(_) => match app.session().error() {
            Some(error) => Some(format!("Error: {error}")),
            None => Some(format!("Balance: {}", app.session().balance())),
        },
        AppEvent::TransferSucceeded(signature) => {
            Some(format!("{SEND_SUCCESS_MESSAGE} Signature: {signature}"))
        }
        AppEvent::TransferFailed(_) => app.session().error().map(|e| format!("Error: {e}")),
        AppEvent::DeadlineReached => None,
    }
}
