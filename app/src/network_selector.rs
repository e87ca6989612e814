//! Network selection with persistence.
//!
//! The selector is the single owner of the "which cluster" decision. Every
//! change is written to the preference store under [`NETWORK_KEY`] so the
//! next session starts on the same network.

use std::sync::Arc;

use solwatch_store::{PreferenceStore, NETWORK_KEY};
use solwatch_types::{Endpoint, EndpointOverrides, Network};

pub struct NetworkSelector {
    store: Arc<dyn PreferenceStore>,
    overrides: EndpointOverrides,
    network: Network,
    endpoint: Endpoint,
}

impl NetworkSelector {
    /// Restore the last selection from `store`, falling back to `default`
    /// when nothing (or something unparseable) is stored.
    pub fn load(
        store: Arc<dyn PreferenceStore>,
        overrides: EndpointOverrides,
        default: Network,
    ) -> Self {
        let stored = match store.get(NETWORK_KEY) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored network, using default");
                None
            }
        };
        let network = Network::from_stored(stored.as_deref(), default);
        let endpoint = Endpoint::for_network(network, &overrides);
        tracing::debug!(%network, %endpoint, "network selection restored");
        Self {
            store,
            overrides,
            network,
            endpoint,
        }
    }

    /// Switch to `network`, persist it and return the new endpoint.
    ///
    /// A failed write is logged; the in-memory selection still changes.
    pub fn select(&mut self, network: Network) -> &Endpoint {
        if let Err(e) = self.store.set(NETWORK_KEY, network.as_str()) {
            tracing::warn!(%network, error = %e, "failed to persist network selection");
        }
        self.network = network;
        self.endpoint = Endpoint::for_network(network, &self.overrides);
        tracing::info!(%network, endpoint = %self.endpoint, "network selected");
        &self.endpoint
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}
