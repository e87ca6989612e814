//! Network identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// Identifies which Solana cluster the application targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// Development cluster with free airdrops.
    #[default]
    #[serde(rename = "devnet")]
    Devnet,
    /// Pre-production test cluster.
    #[serde(rename = "testnet")]
    Testnet,
    /// The production cluster.
    #[serde(rename = "mainnet-beta", alias = "mainnet")]
    Mainnet,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Devnet, Network::Testnet, Network::Mainnet];

    /// Cluster name, also the persisted form of the selection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet-beta",
        }
    }

    /// Public RPC URL operated for the cluster.
    pub fn cluster_url(&self) -> &'static str {
        match self {
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
            Self::Mainnet => "https://api.mainnet-beta.solana.com",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Devnet => "Devnet",
            Self::Testnet => "Testnet",
            Self::Mainnet => "Mainnet",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Devnet => "🧪",
            Self::Testnet => "🛠️",
            Self::Mainnet => "🌐",
        }
    }

    pub fn tooltip(&self) -> &'static str {
        match self {
            Self::Devnet => "Solana Devnet: For development and testing",
            Self::Testnet => "Solana Testnet: For pre-production testing",
            Self::Mainnet => "Solana Mainnet: Real network with real assets",
        }
    }

    /// Cluster name with the first letter capitalised, for the network badge.
    pub fn badge(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Resolve a persisted selection. Absent or unrecognised values fall back
    /// to `default`.
    pub fn from_stored(stored: Option<&str>, default: Network) -> Network {
        stored.and_then(|s| s.parse().ok()).unwrap_or(default)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet-beta" | "mainnet" => Ok(Self::Mainnet),
            other => Err(TypeError::UnknownNetwork(other.to_string())),
        }
    }
}
