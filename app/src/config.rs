//! Application configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use solwatch_rpc::RpcClientConfig;
use solwatch_types::{Commitment, EndpointOverrides, Network, Pubkey};
use solwatch_utils::LogFormat;

use crate::AppError;

/// Addresses watched when the config file does not name any.
pub const DEFAULT_WATCH_LIST: [&str; 4] = [
    "ExnVLJszScgqxZa44UTdTNeaG9PjXVjNvx6xYNUDTDYb",
    "78y7pfJ4eJ9N6aL8h7dvUcfYk3Gw8hDe9G93QQHmiSiz",
    "FkXo6pwD4LzC2obupejhQdp3jHfABG2tXLyhXkXRCaA",
    "83NKMWJDHhULbD9s9baeSrFikdQMiRxfci6WgprhCeQE",
];

/// Configuration for a solwatch session.
///
/// Can be loaded from a TOML file via [`AppConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network used when nothing valid is stored.
    #[serde(default)]
    pub default_network: Network,

    /// HTTP endpoint used on Mainnet instead of the public cluster URL.
    #[serde(default)]
    pub mainnet_endpoint: Option<String>,

    /// Websocket endpoint paired with `mainnet_endpoint`.
    #[serde(default)]
    pub websocket_endpoint: Option<String>,

    /// Addresses whose balances and transactions are watched.
    #[serde(default = "default_watch_list")]
    pub watch_list: Vec<Pubkey>,

    #[serde(default)]
    pub commitment: Commitment,

    /// Minimum delay between two manual balance refreshes.
    #[serde(default = "default_refresh_cooldown_secs")]
    pub refresh_cooldown_secs: u64,

    /// How long the transfer success notice stays visible.
    #[serde(default = "default_notice_duration_secs")]
    pub notice_duration_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,

    /// Bound on each websocket subscribe or unsubscribe call.
    #[serde(default = "default_subscribe_timeout_secs")]
    pub subscribe_timeout_secs: u64,

    /// Keep at most this many notifications; unbounded when absent.
    #[serde(default)]
    pub notification_limit: Option<usize>,

    /// Directory holding the preference file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Connect the selected wallet on startup.
    #[serde(default = "default_true")]
    pub auto_connect: bool,

    #[serde(default)]
    pub wallets: Vec<WalletConfig>,
}

/// A keypair-file wallet offered to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub name: String,
    /// Path to a JSON keypair file (64-byte array).
    pub keypair: PathBuf,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_watch_list() -> Vec<Pubkey> {
    DEFAULT_WATCH_LIST
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect()
}

fn default_refresh_cooldown_secs() -> u64 {
    5
}

fn default_notice_duration_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_confirm_timeout_secs() -> u64 {
    60
}

fn default_subscribe_timeout_secs() -> u64 {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./solwatch_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ── Impl ───────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, AppError> {
        toml::from_str(s).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, AppError> {
        toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn endpoint_overrides(&self) -> EndpointOverrides {
        EndpointOverrides {
            mainnet: self.mainnet_endpoint.clone(),
            mainnet_websocket: self.websocket_endpoint.clone(),
        }
    }

    pub fn rpc_client_config(&self) -> RpcClientConfig {
        RpcClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            ..RpcClientConfig::default()
        }
    }

    pub fn refresh_cooldown(&self) -> Duration {
        Duration::from_secs(self.refresh_cooldown_secs)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.notice_duration_secs)
    }

    pub fn subscribe_timeout(&self) -> Duration {
        Duration::from_secs(self.subscribe_timeout_secs)
    }

    /// Location of the preference file inside `data_dir`.
    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.toml")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_network: Network::default(),
            mainnet_endpoint: None,
            websocket_endpoint: None,
            watch_list: default_watch_list(),
            commitment: Commitment::default(),
            refresh_cooldown_secs: default_refresh_cooldown_secs(),
            notice_duration_secs: default_notice_duration_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
            subscribe_timeout_secs: default_subscribe_timeout_secs(),
            notification_limit: None,
            data_dir: default_data_dir(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            auto_connect: default_true(),
            wallets: Vec::new(),
        }
    }
}
