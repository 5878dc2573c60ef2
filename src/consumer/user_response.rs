//! User Response Consumer
//!
//! Turns queued survey submissions into records of the user table.
//!
//! A message body is a JSON object or a JSON array of objects. Every object carrying the
//! table's partition key (`userid` by default), a `Version` and a `response` upserts the
//! record keyed by that identifier; objects missing any of the three are logged and skipped.

use super::handler::BatchHandler;
use super::types::{BatchResponse, ConsumerInvocationResponse, QueueEvent, QueueRecord};
use crate::functions::types::InvocationResponse;
use crate::store::memory::RecordStore;
use crate::store::types::{Attributes, WriteOutcome};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

pub const USER_ID_FIELD: &str = "userid";
pub const VERSION_FIELD: &str = "Version";
pub const RESPONSE_FIELD: &str = "response";

/// A validated write derived from one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct UserResponseUpdate {
    pub user_id: String,
    pub attributes: Attributes,
}

/// Per-message tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOutcome {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

pub struct UserResponseHandler {
    store: Arc<dyn RecordStore>,
    /// Submission field holding the record identifier; follows the table's partition key.
    key_field: String,
}

impl UserResponseHandler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let key_field = store.schema().partition_key.clone();
        Self { store, key_field }
    }

    /// Processes one queue record. An error means the message must be redelivered.
    pub async fn process_record(&self, record: &QueueRecord) -> Result<MessageOutcome> {
        let submissions = parse_submissions(&record.body)
            .with_context(|| format!("Message {} is not valid JSON", record.message_id))?;

        let mut outcome = MessageOutcome::default();

        for submission in &submissions {
            let Some(update) = extract_update(submission, &self.key_field) else {
                tracing::warn!(
                    "Missing data in message {}: {}",
                    record.message_id,
                    submission
                );
                outcome.skipped += 1;
                continue;
            };

            let written = self
                .store
                .update(&update.user_id, update.attributes)
                .await
                .with_context(|| format!("Failed to update item {}", update.user_id))?;

            match written {
                WriteOutcome::Created => {
                    tracing::debug!("No item found with key {}, created it", update.user_id);
                    outcome.created += 1;
                }
                WriteOutcome::Updated => outcome.updated += 1,
            }
        }

        Ok(outcome)
    }

    /// Entry point when invoked directly with a queue-shaped JSON event.
    pub async fn handle_event(&self, event: Value) -> Result<Value> {
        let event: QueueEvent =
            serde_json::from_value(event).context("Event has no valid Records list")?;

        let batch = self.handle_batch(&event).await?;

        let response = ConsumerInvocationResponse {
            response: InvocationResponse::ok(json!("Request was successful")),
            batch,
        };
        Ok(serde_json::to_value(response)?)
    }
}

#[async_trait]
impl BatchHandler for UserResponseHandler {
    async fn handle_batch(&self, event: &QueueEvent) -> Result<BatchResponse> {
        let mut response = BatchResponse::default();

        for record in &event.records {
            match self.process_record(record).await {
                Ok(outcome) => {
                    tracing::debug!(
                        "Message {}: {} created, {} updated, {} skipped",
                        record.message_id,
                        outcome.created,
                        outcome.updated,
                        outcome.skipped
                    );
                }
                Err(e) => {
                    tracing::error!("Failed to process message {}: {:#}", record.message_id, e);
                    response.fail(&record.message_id);
                }
            }
        }

        Ok(response)
    }
}

/// A body holds either one submission object or a list of them.
pub fn parse_submissions(body: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(body)?;
    Ok(match value {
        Value::Array(items) => items,
        other => vec![other],
    })
}

/// Validates a submission and builds the attribute update for it.
///
/// `key_field` must hold a non-empty string; `Version` and `response` must be present and
/// non-empty. Anything else yields `None`.
pub fn extract_update(submission: &Value, key_field: &str) -> Option<UserResponseUpdate> {
    let user_id = submission.get(key_field)?.as_str()?;
    if user_id.is_empty() {
        return None;
    }

    let version = submission.get(VERSION_FIELD).filter(|v| is_present(v))?;
    let response = submission.get(RESPONSE_FIELD).filter(|v| is_present(v))?;

    let mut attributes = Attributes::new();
    attributes.insert(VERSION_FIELD.to_string(), version.clone());
    attributes.insert(RESPONSE_FIELD.to_string(), response.clone());

    Some(UserResponseUpdate {
        user_id: user_id.to_string(),
        attributes,
    })
}

/// Null, `false`, zero, and empty strings, arrays or objects count as missing.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
