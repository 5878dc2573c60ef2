use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::time::Instant;

use crate::error::QueueError;

/// Unique identifier for a message accepted by the queue.
///
/// Wrapper around a UUID string, assigned once at enqueue time and kept across redeliveries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generates a new random UUID v4-based MessageId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Proof of a single delivery of a message.
///
/// A fresh token is minted every time the message is received, so only the consumer
/// holding the most recent delivery can acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle {
    pub message_id: MessageId,
    pub token: String,
}

impl ReceiptHandle {
    pub fn issue(message_id: MessageId) -> Self {
        Self {
            message_id,
            token: uuid::Uuid::new_v4().simple().to_string(),
        }
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.message_id.0, self.token)
    }
}

impl FromStr for ReceiptHandle {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('#') {
            Some((id, token)) if !id.is_empty() && !token.is_empty() => Ok(Self {
                message_id: MessageId(id.to_string()),
                token: token.to_string(),
            }),
            _ => Err(QueueError::MalformedReceipt(s.to_string())),
        }
    }
}

/// Delivery state of a message held by the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageStatus {
    /// Visible to the next `receive` call.
    Pending,
    /// Handed to a consumer and hidden until `visible_at`.
    InFlight {
        visible_at: Instant,
        receipt_token: String,
    },
}

/// The queue's internal record of one message.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    pub body: Bytes,
    pub status: MessageStatus,
    /// Timestamp (ms) when the message was accepted.
    pub sent_at: u64,
    pub receive_count: u32,
}

impl MessageEntry {
    pub fn new(body: Bytes) -> Self {
        Self {
            body,
            status: MessageStatus::Pending,
            sent_at: now_ms(),
            receive_count: 0,
        }
    }

    /// Pending, or in flight with an expired visibility window.
    pub fn is_visible(&self, now: Instant) -> bool {
        match &self.status {
            MessageStatus::Pending => true,
            MessageStatus::InFlight { visible_at, .. } => now >= *visible_at,
        }
    }
}

/// A message as handed to a consumer by `receive`.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub message_id: MessageId,
    pub receipt: ReceiptHandle,
    pub body: Bytes,
    pub sent_at: u64,
    /// Number of times the message has been received, this delivery included.
    pub receive_count: u32,
}

/// A message moved aside by the redrive policy.
#[derive(Debug, Clone, Serialize)]
pub struct DeadLetter {
    pub message_id: MessageId,
    pub body: String,
    pub sent_at: u64,
    pub receive_count: u32,
    pub dead_lettered_at: u64,
}

/// Approximate counters, in the spirit of SQS queue attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueueAttributes {
    pub queue_name: String,
    pub visibility_timeout_seconds: u64,
    pub approximate_number_of_messages: usize,
    pub approximate_number_of_messages_not_visible: usize,
    pub approximate_number_of_dead_letters: usize,
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
