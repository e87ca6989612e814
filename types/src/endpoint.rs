//! RPC endpoint derivation.
//!
//! An [`Endpoint`] is a pure function of the selected [`Network`] and the
//! configured [`EndpointOverrides`]. It has no identity of its own and is
//! recomputed whenever the selection changes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Network;

/// Operator-supplied endpoint overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointOverrides {
    /// HTTP endpoint used instead of the public cluster URL on Mainnet.
    #[serde(default)]
    pub mainnet: Option<String>,

    /// Websocket endpoint used on Mainnet instead of the one derived from
    /// the HTTP URL.
    #[serde(default)]
    pub mainnet_websocket: Option<String>,
}

/// The pair of URLs used to talk to a cluster.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub http: String,
    pub websocket: String,
}

impl Endpoint {
    /// Build an endpoint from an HTTP URL, deriving the websocket URL.
    pub fn from_http(http: impl Into<String>) -> Self {
        let http = http.into();
        let websocket = websocket_url(&http);
        Self { http, websocket }
    }

    /// Resolve the endpoint for `network`.
    ///
    /// Mainnet uses the override when one is configured and non-empty; every
    /// other network uses its public cluster URL.
    pub fn for_network(network: Network, overrides: &EndpointOverrides) -> Self {
        if network == Network::Mainnet {
            if let Some(url) = non_empty(&overrides.mainnet) {
                let mut endpoint = Self::from_http(url);
                if let Some(ws) = non_empty(&overrides.mainnet_websocket) {
                    endpoint.websocket = ws.to_string();
                }
                return endpoint;
            }
        }
        Self::from_http(network.cluster_url())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.http)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Derive the pubsub URL from an HTTP RPC URL: `http` becomes `ws`, `https`
/// becomes `wss`, and an explicit port is bumped by one.
pub fn websocket_url(http: &str) -> String {
    let (scheme, rest) = match http.split_once("://") {
        Some(("https", rest)) => ("wss", rest),
        Some(("http", rest)) => ("ws", rest),
        Some((other, rest)) => (other, rest),
        None => ("ws", http),
    };

    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    // Only look for a port after the closing bracket of an IPv6 literal.
    let host_end = authority.rfind(']').map(|i| i + 1).unwrap_or(0);
    let authority = match authority[host_end..].rfind(':') {
        Some(offset) => {
            let colon = host_end + offset;
            let (host, port) = (&authority[..colon], &authority[colon + 1..]);
            match port.parse::<u16>() {
                Ok(p) => format!("{}:{}", host, p.saturating_add(1)),
                Err(_) => authority.to_string(),
            }
        }
        None => authority.to_string(),
    };

    format!("{scheme}://{authority}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devnet_uses_cluster_url() {
        let endpoint = Endpoint::for_network(Network::Devnet, &EndpointOverrides::default());
        assert_eq!(endpoint.http, "https://api.devnet.solana.com");
        assert_eq!(endpoint.websocket, "wss://api.devnet.solana.com");
    }

    #[test]
    fn mainnet_uses_override() {
        let overrides = EndpointOverrides {
            mainnet: Some("https://example-rpc.invalid/abc123".into()),
            mainnet_websocket: None,
        };
        let endpoint = Endpoint::for_network(Network::Mainnet, &overrides);
        assert_eq!(endpoint.http, "https://example-rpc.invalid/abc123");
        assert_eq!(endpoint.websocket, "wss://example-rpc.invalid/abc123");
    }

    #[test]
    fn mainnet_without_override_uses_cluster_url() {
        let overrides = EndpointOverrides {
            mainnet: Some("   ".into()),
            mainnet_websocket: None,
        };
        let endpoint = Endpoint::for_network(Network::Mainnet, &overrides);
        assert_eq!(endpoint.http, Network::Mainnet.cluster_url());
    }

    #[test]
    fn override_does_not_leak_into_other_networks() {
        let overrides = EndpointOverrides {
            mainnet: Some("https://example-rpc.invalid".into()),
            mainnet_websocket: None,
        };
        let endpoint = Endpoint::for_network(Network::Testnet, &overrides);
        assert_eq!(endpoint.http, "https://api.testnet.solana.com");
    }

    #[test]
    fn explicit_websocket_override_wins() {
        let overrides = EndpointOverrides {
            mainnet: Some("https://example-rpc.invalid".into()),
            mainnet_websocket: Some("wss://stream.example-rpc.invalid".into()),
        };
        let endpoint = Endpoint::for_network(Network::Mainnet, &overrides);
        assert_eq!(endpoint.websocket, "wss://stream.example-rpc.invalid");
    }

    #[test]
    fn websocket_port_is_bumped() {
        assert_eq!(websocket_url("http://127.0.0.1:8899"), "ws://127.0.0.1:8900");
        assert_eq!(websocket_url("http://[::1]:8899/rpc"), "ws://[::1]:8900/rpc");
        assert_eq!(websocket_url("https://host.invalid/path"), "wss://host.invalid/path");
    }
}
