//! solwatch: watch Solana balances and transactions, send SOL from a keypair
//! wallet.

mod console;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use solwatch_app::{App, AppConfig, AppEvent, HttpConnector, ShutdownController};
use solwatch_store::FilePreferenceStore;
use solwatch_types::Network;
use solwatch_utils::{init_logging, LogFormat};
use solwatch_wallet_core::{KeypairWallet, WalletRegistry};

#[derive(Parser)]
#[command(name = "solwatch", about = "Solana balance watcher and wallet console")]
struct Cli {
    /// Network to use: "devnet", "testnet" or "mainnet-beta". The choice is
    /// remembered for the next run.
    #[arg(long, env = "SOLWATCH_NETWORK")]
    network: Option<Network>,

    /// HTTP RPC endpoint used on mainnet instead of the public cluster URL.
    #[arg(long, env = "SOLWATCH_MAINNET_ENDPOINT")]
    mainnet_endpoint: Option<String>,

    /// Websocket endpoint paired with the mainnet override.
    #[arg(long, env = "SOLWATCH_WEBSOCKET_ENDPOINT")]
    websocket_endpoint: Option<String>,

    /// Directory holding the preference file.
    #[arg(long, env = "SOLWATCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SOLWATCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SOLWATCH_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SOLWATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Interactive console: balances, notifications, wallet and transfers.
    Run {
        /// Wallet to connect instead of the first configured one.
        #[arg(long)]
        wallet: Option<String>,
    },
    /// Fetch the watch list balances once and exit.
    Balances,
    /// Print transaction notifications for the watch list until Ctrl-C.
    Watch,
}

impl Cli {
    /// File settings (or defaults) overridden by flags and env vars.
    fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let base = match &self.config {
            Some(path) => AppConfig::from_toml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => AppConfig::default(),
        };
        Ok(AppConfig {
            mainnet_endpoint: self.mainnet_endpoint.clone().or(base.mainnet_endpoint),
            websocket_endpoint: self.websocket_endpoint.clone().or(base.websocket_endpoint),
            data_dir: self.data_dir.clone().unwrap_or(base.data_dir),
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            log_format: self.log_format.unwrap_or(base.log_format),
            ..base
        })
    }
}

fn load_wallets(config: &AppConfig) -> anyhow::Result<WalletRegistry> {
    let mut wallets = WalletRegistry::new();
    for wallet in &config.wallets {
        let adapter =
            KeypairWallet::from_file(&wallet.name, &wallet.keypair).with_context(|| {
                format!("loading wallet {} from {}", wallet.name, wallet.keypair.display())
            })?;
        wallets.register(Arc::new(adapter));
    }
    Ok(wallets)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = cli.resolve_config()?;

    init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    let wallets = load_wallets(&config)?;
    let store = Arc::new(FilePreferenceStore::open(config.preferences_path()));
    let connector = Arc::new(HttpConnector::new(config.rpc_client_config()));

    let shutdown = Arc::new(ShutdownController::new());
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.wait_for_signal().await });
    }

    let preferred_wallet = match &cli.command {
        Command::Run { wallet } => wallet.clone(),
        Command::Balances | Command::Watch => {
            config.auto_connect = false;
            None
        }
    };

    let mut app = App::new(config, store, connector, wallets)?;
    if let Some(network) = cli.network {
        app.select_network(network)?;
    }

    match cli.command {
        Command::Run { .. } => {
            app.start().await;
            if let Some(name) = preferred_wallet.as_deref() {
                app.connect_wallet(Some(name)).await?;
            }
            console::run(&mut app, shutdown.subscribe()).await?;
        }
        Command::Balances => {
            app.start().await;
            app.run_until_idle().await;
            print!("{}", render::balances(app.watcher()));
        }
        Command::Watch => {
            app.start().await;
            watch(&mut app, &shutdown).await;
        }
    }

    app.shutdown().await;
    tracing::info!("solwatch exited cleanly");
    Ok(())
}

async fn watch(app: &mut App, shutdown: &ShutdownController) {
    println!("{}", render::header(app));
    let mut signal = shutdown.subscribe();
    loop {
        tokio::select! {
            _ = signal.triggered() => break,
            event = app.next_event() => match event {
                AppEvent::Notification(text) => println!("{text}"),
                AppEvent::BalancesUpdated { .. } => print!("{}", render::balances(app.watcher())),
                AppEvent::SubscriptionDropped(_) => {
                    if let Some(line) = render::event(app, &event) {
                        println!("{line}");
                    }
                }
                _ => {}
            },
        }
    }
}
