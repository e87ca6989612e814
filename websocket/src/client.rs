//! Websocket pubsub client.
//!
//! One socket per endpoint, owned by a background task. Callers talk to the
//! task through a command channel; the task matches replies to requests by
//! id and routes notifications to each subscription's sink.
//!
//! The socket is opened lazily on the first subscription and reopened on
//! demand after it drops. Subscriptions do not survive a reconnect: when the
//! server goes away every live subscription sends [`PubsubEvent::Dropped`]
//! to its sink, and the owner must subscribe again.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use solwatch_types::{Commitment, Pubkey};
use std::collections::HashMap;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::PubsubError;
use crate::subscriptions::{
    logs_subscribe_request, logs_unsubscribe_request, parse_logs_notification, Incoming,
    PubsubEvent, SubscriptionId,
};
use crate::LogSubscriber;

type Reply<T> = oneshot::Sender<Result<T, PubsubError>>;
type Sink = mpsc::UnboundedSender<PubsubEvent>;
type Subscriptions = HashMap<SubscriptionId, (Pubkey, Sink)>;

enum Command {
    Subscribe {
        address: Pubkey,
        commitment: Commitment,
        sink: Sink,
        reply: Reply<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        reply: Reply<()>,
    },
}

enum Pending {
    Subscribe {
        address: Pubkey,
        sink: Sink,
        reply: Reply<SubscriptionId>,
    },
    Unsubscribe {
        reply: Reply<()>,
    },
}

struct Connection {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

/// Pubsub client bound to one websocket URL.
pub struct PubsubClient {
    url: String,
    connection: Mutex<Option<Connection>>,
}

impl PubsubClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Hand `command` to the socket task, connecting first if needed.
    async fn dispatch(&self, command: Command) -> Result<(), PubsubError> {
        let mut guard = self.connection.lock().await;
        let alive = guard
            .as_ref()
            .is_some_and(|c| !c.task.is_finished() && !c.commands.is_closed());
        if !alive {
            *guard = Some(self.connect().await?);
        }
        let connection = guard.as_ref().ok_or(PubsubError::Closed)?;
        connection
            .commands
            .send(command)
            .map_err(|_| PubsubError::Closed)
    }

    async fn connect(&self) -> Result<Connection, PubsubError> {
        let (socket, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| PubsubError::Connect {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;
        info!(url = %self.url, "pubsub connected");
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_socket(socket, rx, self.url.clone()));
        Ok(Connection { commands, task })
    }
}

#[async_trait]
impl LogSubscriber for PubsubClient {
    async fn subscribe_logs(
        &self,
        address: &Pubkey,
        commitment: Commitment,
        sink: Sink,
    ) -> Result<SubscriptionId, PubsubError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(Command::Subscribe {
            address: *address,
            commitment,
            sink,
            reply,
        })
        .await?;
        rx.await.map_err(|_| PubsubError::Closed)?
    }

    async fn unsubscribe_logs(&self, id: SubscriptionId) -> Result<(), PubsubError> {
        let mut guard = self.connection.lock().await;
        let Some(connection) = guard.as_mut() else {
            // Never connected, so there is nothing to release server-side.
            return Ok(());
        };
        let (reply, rx) = oneshot::channel();
        if connection
            .commands
            .send(Command::Unsubscribe { id, reply })
            .is_err()
        {
            return Ok(());
        }
        drop(guard);
        rx.await.map_err(|_| PubsubError::Closed)?
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Owns the socket until the client is dropped (command channel closed) or
/// the server goes away. Dropping the client therefore closes the socket.
async fn run_socket(socket: Socket, mut commands: mpsc::UnboundedReceiver<Command>, url: String) {
    let (mut writer, mut reader) = socket.split();
    let mut next_id: u64 = 1;
    let mut pending: HashMap<u64, Pending> = HashMap::new();
    let mut subscriptions = Subscriptions::new();

    let lost = loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!(%url, "pubsub client dropped, closing socket");
                    let _ = writer.send(Message::Close(None)).await;
                    break false;
                };
                let id = next_id;
                next_id += 1;
                let (request, entry) = match command {
                    Command::Subscribe { address, commitment, sink, reply } => (
                        logs_subscribe_request(id, &address, commitment),
                        Pending::Subscribe { address, sink, reply },
                    ),
                    Command::Unsubscribe { id: sub, reply } => {
                        if subscriptions.remove(&sub).is_none() {
                            let _ = reply.send(Ok(()));
                            continue;
                        }
                        (logs_unsubscribe_request(id, sub), Pending::Unsubscribe { reply })
                    }
                };
                if let Err(e) = writer.send(Message::Text(request.to_string())).await {
                    warn!(%url, "pubsub send failed: {e}");
                    fail(entry);
                    break true;
                }
                pending.insert(id, entry);
            }
            frame = reader.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        info!(%url, "pubsub socket closed by server");
                        break true;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!(%url, "pubsub receive error: {e}");
                        break true;
                    }
                };
                handle_frame(&text, &mut pending, &mut subscriptions);
            }
        }
    };

    for (_, entry) in pending.drain() {
        fail(entry);
    }
    if lost {
        let dropped = notify_dropped(subscriptions);
        info!(%url, dropped, "pubsub subscriptions dropped with the socket");
    }
}

/// Tell every subscription's sink that its socket is gone. Returns how many
/// subscriptions were dropped.
fn notify_dropped(subscriptions: Subscriptions) -> usize {
    let count = subscriptions.len();
    for (subscription, (address, sink)) in subscriptions {
        let _ = sink.send(PubsubEvent::Dropped {
            subscription,
            address,
        });
    }
    count
}

fn fail(entry: Pending) {
    match entry {
        Pending::Subscribe { reply, .. } => {
            let _ = reply.send(Err(PubsubError::Closed));
        }
        Pending::Unsubscribe { reply } => {
            let _ = reply.send(Err(PubsubError::Closed));
        }
    }
}

fn handle_frame(
    text: &str,
    pending: &mut HashMap<u64, Pending>,
    subscriptions: &mut Subscriptions,
) {
    let incoming: Incoming = match serde_json::from_str(text) {
        Ok(incoming) => incoming,
        Err(e) => {
            warn!("ignoring undecodable pubsub frame: {e}");
            return;
        }
    };

    if let Some(id) = incoming.id {
        let Some(entry) = pending.remove(&id) else {
            debug!(id, "reply for unknown request");
            return;
        };
        let outcome = match incoming.error {
            Some(err) => Err(PubsubError::Rpc {
                code: err.code,
                message: err.message,
            }),
            None => Ok(incoming.result.unwrap_or(Value::Null)),
        };
        match entry {
            Pending::Subscribe { address, sink, reply } => {
                let result = outcome.and_then(|value| {
                    value.as_u64().map(SubscriptionId).ok_or_else(|| {
                        PubsubError::InvalidMessage(format!("subscription id: {value}"))
                    })
                });
                match &result {
                    // The caller timed out and already counted this as a failure.
                    Ok(sub) if reply.is_closed() => {
                        debug!(%address, subscription = %sub, "late subscription reply ignored");
                    }
                    Ok(sub) => {
                        debug!(%address, subscription = %sub, "logs subscription opened");
                        subscriptions.insert(*sub, (address, sink));
                    }
                    Err(_) => {}
                }
                let _ = reply.send(result);
            }
            Pending::Unsubscribe { reply } => {
                let _ = reply.send(outcome.map(|_| ()));
            }
        }
        return;
    }

    if incoming.method.as_deref() == Some("logsNotification") {
        let Some(params) = incoming.params else {
            return;
        };
        let sub = SubscriptionId(params.subscription);
        let Some((address, sink)) = subscriptions.get(&sub) else {
            debug!(subscription = %sub, "notification for unknown subscription");
            return;
        };
        match parse_logs_notification(sub, *address, params.result) {
            Ok(event) => {
                let _ = sink.send(PubsubEvent::Log(event));
            }
            Err(e) => warn!(subscription = %sub, "bad logs notification: {e}"),
        }
    }
}
