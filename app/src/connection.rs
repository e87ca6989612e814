//! Connections to a cluster endpoint.

use std::sync::Arc;

use solwatch_rpc::{ChainClient, HttpRpcClient, RpcClientConfig};
use solwatch_types::Endpoint;
use solwatch_websocket::{LogSubscriber, PubsubClient};

use crate::AppError;

/// The clients bound to one endpoint. Replaced wholesale when the network
/// changes.
#[derive(Clone)]
pub struct Connection {
    pub endpoint: Endpoint,
    pub rpc: Arc<dyn ChainClient>,
    pub pubsub: Arc<dyn LogSubscriber>,
}

/// Opens connections for the runtime.
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &Endpoint) -> Result<Connection, AppError>;
}

/// Connects over HTTP JSON-RPC and the pubsub websocket.
pub struct HttpConnector {
    rpc_config: RpcClientConfig,
}

impl HttpConnector {
    pub fn new(rpc_config: RpcClientConfig) -> Self {
        Self { rpc_config }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Connection, AppError> {
        let rpc = HttpRpcClient::new(endpoint.http.clone(), self.rpc_config.clone())?;
        let pubsub = PubsubClient::new(endpoint.websocket.clone());
        tracing::debug!(
            http = %endpoint.http,
            websocket = %endpoint.websocket,
            "connection opened"
        );
        Ok(Connection {
            endpoint: endpoint.clone(),
            rpc: Arc::new(rpc),
            pubsub: Arc::new(pubsub),
        })
    }
}
