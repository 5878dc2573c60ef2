use crate::functions::types::InvocationResponse;
use crate::queue::types::ReceivedMessage;
use serde::{Deserialize, Serialize};

/// A batch of queue messages, in the shape queue-triggered functions receive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records")]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub receipt_handle: String,
    pub body: String,
    #[serde(default)]
    pub approximate_receive_count: u32,
}

impl QueueEvent {
    pub fn from_messages(messages: &[ReceivedMessage]) -> Self {
        Self {
            records: messages
                .iter()
                .map(|message| QueueRecord {
                    message_id: message.message_id.0.clone(),
                    receipt_handle: message.receipt.to_string(),
                    body: String::from_utf8_lossy(&message.body).into_owned(),
                    approximate_receive_count: message.receive_count,
                })
                .collect(),
        }
    }
}

/// Partial batch result: the messages listed here must not be acknowledged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(rename = "batchItemFailures")]
    pub batch_item_failures: Vec<BatchItemFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    #[serde(rename = "itemIdentifier")]
    pub item_identifier: String,
}

impl BatchResponse {
    pub fn fail(&mut self, message_id: &str) {
        self.batch_item_failures.push(BatchItemFailure {
            item_identifier: message_id.to_string(),
        });
    }

    pub fn is_success(&self) -> bool {
        self.batch_item_failures.is_empty()
    }
}

/// What the consumer returns when invoked directly through the function registry.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumerInvocationResponse {
    #[serde(flatten)]
    pub response: InvocationResponse,
    #[serde(flatten)]
    pub batch: BatchResponse,
}

/// Outcome of one poller batch, used for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub received: usize,
    pub deleted: usize,
    pub failed: usize,
}
