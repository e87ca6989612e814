//! Interactive console over stdin.
//!
//! User input and runtime events are multiplexed on one loop, so every
//! command sees the state left by the last applied event.

use solwatch_app::{App, ShutdownSignal};
use solwatch_types::Network;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use crate::render;

const HELP: &str = "\
Commands:
  status                 network, wallet and balance
  balances               watched address balances
  notifications          detected transactions
  networks               available networks
  network <name>         switch network (devnet, testnet, mainnet-beta)
  reload                 fetch watched balances again
  wallets                configured wallets
  connect [name]         connect a wallet
  disconnect             disconnect the wallet
  refresh                refresh the wallet balance
  to <address>           set the transfer recipient
  amount <sol>           set the transfer amount
  send [address amount]  send SOL
  help                   this text
  quit                   exit";

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    Status,
    Balances,
    Notifications,
    Networks,
    Network(Network),
    Reload,
    Wallets,
    Connect(Option<String>),
    Disconnect,
    Refresh,
    Recipient(String),
    Amount(String),
    Send(Option<(String, String)>),
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("help" | "?", []) => ConsoleCommand::Help,
        ("status", []) => ConsoleCommand::Status,
        ("balances", []) => ConsoleCommand::Balances,
        ("notifications" | "log", []) => ConsoleCommand::Notifications,
        ("networks", []) => ConsoleCommand::Networks,
        ("network", [name]) => ConsoleCommand::Network(name.parse().map_err(|e| format!("{e}"))?),
        ("reload", []) => ConsoleCommand::Reload,
        ("wallets", []) => ConsoleCommand::Wallets,
        ("connect", []) => ConsoleCommand::Connect(None),
        ("connect", [name]) => ConsoleCommand::Connect(Some(name.to_string())),
        ("disconnect", []) => ConsoleCommand::Disconnect,
        ("refresh", []) => ConsoleCommand::Refresh,
        ("to", [address]) => ConsoleCommand::Recipient(address.to_string()),
        ("amount", [amount]) => ConsoleCommand::Amount(amount.to_string()),
        ("send", []) => ConsoleCommand::Send(None),
        ("send", [address, amount]) => {
            ConsoleCommand::Send(Some((address.to_string(), amount.to_string())))
        }
        ("quit" | "exit", []) => ConsoleCommand::Quit,
        (verb, _) => return Err(format!("unknown command or arguments: {verb} (try `help`)")),
    };
    Ok(Some(command))
}

pub async fn run(app: &mut App, mut shutdown: ShutdownSignal) -> anyhow::Result<()> {
    println!("{}", render::header(app));
    println!("Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = shutdown.triggered() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Ok(Some(command)) => execute(app, command).await,
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            event = app.next_event() => {
                if let Some(text) = render::event(app, &event) {
                    println!("{text}");
                }
            }
        }
    }
    Ok(())
}

async fn execute(app: &mut App, command: ConsoleCommand) {
    let now = Instant::now();
    match command {
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Status => {
            println!("{}", render::header(app));
            print!("{}", render::session(app, now));
        }
        ConsoleCommand::Balances => print!("{}", render::balances(app.watcher())),
        ConsoleCommand::Notifications => print!("{}", render::notifications(app.watcher())),
        ConsoleCommand::Networks => print!("{}", render::networks(app.network())),
        ConsoleCommand::Network(network) => match app.select_network(network) {
            Ok(_) => println!("{}", render::header(app)),
            Err(e) => println!("Error: {e}"),
        },
        ConsoleCommand::Reload => {
            app.fetch_watch_list();
            println!("Loading balances...");
        }
        ConsoleCommand::Wallets => print!("{}", render::wallets(app)),
        ConsoleCommand::Connect(name) => match app.connect_wallet(name.as_deref()).await {
            Ok(owner) => println!("Connected {owner}"),
            Err(e) => println!("Error: {e}"),
        },
        ConsoleCommand::Disconnect => match app.disconnect_wallet().await {
            Ok(()) => println!("Disconnected"),
            Err(e) => println!("Error: {e}"),
        },
        ConsoleCommand::Refresh => println!("{}", render::refresh(&app.refresh())),
        ConsoleCommand::Recipient(address) => app.set_recipient(address),
        ConsoleCommand::Amount(amount) => app.set_amount(amount),
        ConsoleCommand::Send(inputs) => {
            if let Some((address, amount)) = inputs {
                app.set_recipient(address);
                app.set_amount(amount);
            }
            match app.submit_transfer() {
                Ok(()) => println!("{}", app.session().send_label()),
                Err(e) => println!("Error: {e}"),
            }
        }
        ConsoleCommand::Quit => {}
    }
}
