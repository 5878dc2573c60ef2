//! In-Memory Message Queue
//!
//! Implements an unordered, at-least-once queue with visibility-timeout semantics.
//!
//! ## Responsibilities
//! - **Enqueue**: Accepting opaque message bodies and assigning them a `MessageId`.
//! - **Claiming**: Handing visible messages to one consumer at a time and hiding them for
//!   the visibility window (the queue-side equivalent of a task lease).
//! - **Redelivery**: Messages whose window expires without a `delete` become visible again.
//! - **Redrive**: Optionally moving messages that keep failing to a dead-letter list.

use super::types::*;
use crate::error::QueueError;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Queue operations the ingress endpoint and the consumer depend on.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Accepts one message. The body is stored verbatim.
    async fn send(&self, body: Bytes) -> Result<MessageId, QueueError>;

    /// Claims up to `max` visible messages for this caller.
    async fn receive(&self, max: usize) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Acknowledges a delivery, removing the message for good.
    async fn delete(&self, receipt: &ReceiptHandle) -> Result<(), QueueError>;

    /// Resets the hide window of a delivery. A zero timeout makes it visible immediately.
    async fn change_visibility(
        &self,
        receipt: &ReceiptHandle,
        timeout: Duration,
    ) -> Result<(), QueueError>;

    fn attributes(&self) -> QueueAttributes;

    fn dead_letters(&self) -> Vec<DeadLetter>;
}

/// Redrive settings. Disabled unless `max_receive_count` is set.
#[derive(Debug, Clone, Default)]
pub struct RedrivePolicy {
    pub max_receive_count: Option<u32>,
}

pub struct InMemoryQueue {
    name: String,
    visibility_timeout: Duration,
    redrive: RedrivePolicy,
    /// `DashMap` gives per-shard locking, so claims on different messages don't contend.
    messages: DashMap<MessageId, MessageEntry>,
    dead_letters: DashMap<MessageId, DeadLetter>,
}

impl InMemoryQueue {
    pub fn new(name: impl Into<String>, visibility_timeout: Duration) -> Self {
        Self::with_redrive(name, visibility_timeout, RedrivePolicy::default())
    }

    pub fn with_redrive(
        name: impl Into<String>,
        visibility_timeout: Duration,
        redrive: RedrivePolicy,
    ) -> Self {
        Self {
            name: name.into(),
            visibility_timeout,
            redrive,
            messages: DashMap::new(),
            dead_letters: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }

    /// Total number of messages held, visible or not.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Ids of messages a `receive` issued now could claim.
    fn visible_candidates(&self, now: Instant) -> Vec<MessageId> {
        self.messages
            .iter()
            .filter(|entry| entry.value().is_visible(now))
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn exhausted(&self, entry: &MessageEntry) -> bool {
        match self.redrive.max_receive_count {
            Some(max) => entry.receive_count >= max,
            None => false,
        }
    }

    /// Moves an exhausted message to the dead-letter list, if it still qualifies.
    fn dead_letter(&self, message_id: &MessageId, now: Instant) {
        let removed = self
            .messages
            .remove_if(message_id, |_, entry| {
                entry.is_visible(now) && self.exhausted(entry)
            });

        if let Some((id, entry)) = removed {
            tracing::warn!(
                "Message {} moved to dead-letter list after {} receives",
                id,
                entry.receive_count
            );
            self.dead_letters.insert(
                id.clone(),
                DeadLetter {
                    message_id: id,
                    body: String::from_utf8_lossy(&entry.body).into_owned(),
                    sent_at: entry.sent_at,
                    receive_count: entry.receive_count,
                    dead_lettered_at: now_ms(),
                },
            );
        }
    }

    /// Attempts to claim one message for delivery.
    ///
    /// Re-checks visibility under the entry lock: another receiver may have claimed the
    /// message between candidate selection and this call.
    fn try_claim(&self, message_id: &MessageId, now: Instant) -> Option<ReceivedMessage> {
        let mut entry = self.messages.get_mut(message_id)?;

        if !entry.is_visible(now) {
            return None;
        }

        let receipt = ReceiptHandle::issue(message_id.clone());
        entry.receive_count += 1;
        entry.status = MessageStatus::InFlight {
            visible_at: now + self.visibility_timeout,
            receipt_token: receipt.token.clone(),
        };

        tracing::trace!(
            "Claimed message {} (receive #{})",
            message_id,
            entry.receive_count
        );

        Some(ReceivedMessage {
            message_id: message_id.clone(),
            receipt,
            body: entry.body.clone(),
            sent_at: entry.sent_at,
            receive_count: entry.receive_count,
        })
    }

    /// Runs `f` on the entry the receipt refers to, provided the receipt is current.
    fn with_current_delivery<T>(
        &self,
        receipt: &ReceiptHandle,
        f: impl FnOnce(&mut MessageEntry) -> T,
    ) -> Result<T, QueueError> {
        let mut entry = self
            .messages
            .get_mut(&receipt.message_id)
            .ok_or_else(|| QueueError::MessageNotFound(receipt.message_id.clone()))?;

        let current = matches!(
            &entry.status,
            MessageStatus::InFlight { receipt_token, .. } if *receipt_token == receipt.token
        );

        if !current {
            return Err(QueueError::StaleReceipt(receipt.message_id.clone()));
        }
        Ok(f(entry.value_mut()))
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn send(&self, body: Bytes) -> Result<MessageId, QueueError> {
        let message_id = MessageId::new();
        let size = body.len();
        self.messages
            .insert(message_id.clone(), MessageEntry::new(body));

        tracing::debug!(
            "Queue {} accepted message {} ({} bytes)",
            self.name,
            message_id,
            size
        );

        Ok(message_id)
    }

    async fn receive(&self, max: usize) -> Result<Vec<ReceivedMessage>, QueueError> {
        let now = Instant::now();
        let mut batch = Vec::new();

        if max == 0 {
            return Ok(batch);
        }

        for message_id in self.visible_candidates(now) {
            if batch.len() >= max {
                break;
            }

            let exhausted = self
                .messages
                .get(&message_id)
                .map(|entry| self.exhausted(&entry))
                .unwrap_or(false);

            if exhausted {
                self.dead_letter(&message_id, now);
                continue;
            }

            if let Some(message) = self.try_claim(&message_id, now) {
                batch.push(message);
            }
        }

        if !batch.is_empty() {
            tracing::debug!("Queue {} delivered {} messages", self.name, batch.len());
        }

        Ok(batch)
    }

    async fn delete(&self, receipt: &ReceiptHandle) -> Result<(), QueueError> {
        let removed = self.messages.remove_if(&receipt.message_id, |_, entry| {
            matches!(
                &entry.status,
                MessageStatus::InFlight { receipt_token, .. } if *receipt_token == receipt.token
            )
        });

        match removed {
            Some(_) => {
                tracing::debug!("Deleted message {}", receipt.message_id);
                Ok(())
            }
            None if self.messages.contains_key(&receipt.message_id) => {
                Err(QueueError::StaleReceipt(receipt.message_id.clone()))
            }
            None => Err(QueueError::MessageNotFound(receipt.message_id.clone())),
        }
    }

    async fn change_visibility(
        &self,
        receipt: &ReceiptHandle,
        timeout: Duration,
    ) -> Result<(), QueueError> {
        let now = Instant::now();
        self.with_current_delivery(receipt, |entry| {
            if let MessageStatus::InFlight { visible_at, .. } = &mut entry.status {
                *visible_at = now + timeout;
            }
        })
    }

    fn attributes(&self) -> QueueAttributes {
        let now = Instant::now();
        let visible = self
            .messages
            .iter()
            .filter(|entry| entry.value().is_visible(now))
            .count();

        QueueAttributes {
            queue_name: self.name.clone(),
            visibility_timeout_seconds: self.visibility_timeout.as_secs(),
            approximate_number_of_messages: visible,
            approximate_number_of_messages_not_visible: self.messages.len().saturating_sub(visible),
            approximate_number_of_dead_letters: self.dead_letters.len(),
        }
    }

    fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
