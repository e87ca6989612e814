//! Websocket pubsub client for real-time updates.
//!
//! Watched addresses are observed through `logsSubscribe` with a `mentions`
//! filter: every confirmed transaction that touches the address produces one
//! [`PubsubEvent::Log`] on the subscriber's channel. When the socket is lost,
//! each of its subscriptions reports [`PubsubEvent::Dropped`] instead.

pub mod client;
pub mod error;
pub mod subscriptions;

use async_trait::async_trait;
use solwatch_types::{Commitment, Pubkey};
use tokio::sync::mpsc;

pub use client::PubsubClient;
pub use error::PubsubError;
pub use subscriptions::{LogEvent, PubsubEvent, SubscriptionId};

/// Opens and releases log subscriptions on the active endpoint.
#[async_trait]
pub trait LogSubscriber: Send + Sync {
    /// Subscribe to transactions mentioning `address`. Events are delivered to
    /// `sink` until the subscription is released. If the connection drops
    /// first, `sink` gets a final [`PubsubEvent::Dropped`].
    async fn subscribe_logs(
        &self,
        address: &Pubkey,
        commitment: Commitment,
        sink: mpsc::UnboundedSender<PubsubEvent>,
    ) -> Result<SubscriptionId, PubsubError>;

    /// Release a subscription opened by `subscribe_logs`.
    async fn unsubscribe_logs(&self, id: SubscriptionId) -> Result<(), PubsubError>;
}
