//! Pubsub message shapes.

use serde::Deserialize;
use serde_json::{json, Value};
use solwatch_types::{Commitment, Pubkey, Signature};
use std::fmt;

/// Server-assigned subscription identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transaction observed on a watched address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEvent {
    pub subscription: SubscriptionId,
    pub address: Pubkey,
    pub signature: Signature,
    pub slot: u64,
    /// The transaction error, if it failed on chain.
    pub err: Option<String>,
}

/// What a subscription's sink receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PubsubEvent {
    Log(LogEvent),
    /// The socket carrying `subscription` went away. No further events
    /// arrive for it; the owner has to subscribe `address` again.
    Dropped {
        subscription: SubscriptionId,
        address: Pubkey,
    },
}

/// Build a `logsSubscribe` request for transactions mentioning `address`.
pub fn logs_subscribe_request(id: u64, address: &Pubkey, commitment: Commitment) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "logsSubscribe",
        "params": [
            { "mentions": [address.to_string()] },
            { "commitment": commitment.as_str() },
        ],
    })
}

pub fn logs_unsubscribe_request(id: u64, subscription: SubscriptionId) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "logsUnsubscribe",
        "params": [subscription.0],
    })
}

/// Any frame the server sends: a reply to a request or a notification.
#[derive(Debug, Deserialize)]
pub struct Incoming {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<IncomingError>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<NotificationParams>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
    pub subscription: u64,
    pub result: Value,
}

#[derive(Debug, Deserialize)]
struct LogsResult {
    context: LogsContext,
    value: LogsValue,
}

#[derive(Debug, Deserialize)]
struct LogsContext {
    slot: u64,
}

#[derive(Debug, Deserialize)]
struct LogsValue {
    signature: String,
    #[serde(default)]
    err: Option<Value>,
}

/// Decode the `result` of a `logsNotification` for `address`.
pub fn parse_logs_notification(
    subscription: SubscriptionId,
    address: Pubkey,
    result: Value,
) -> Result<LogEvent, String> {
    let logs: LogsResult = serde_json::from_value(result).map_err(|e| e.to_string())?;
    let signature = logs
        .value
        .signature
        .parse()
        .map_err(|e| format!("signature: {e}"))?;
    Ok(LogEvent {
        subscription,
        address,
        signature,
        slot: logs.context.slot,
        err: logs.value.err.map(|e| e.to_string()),
    })
}
