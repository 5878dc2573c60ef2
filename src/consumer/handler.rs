use super::types::{BatchResponse, QueueEvent};

use anyhow::Result;
use async_trait::async_trait;

/// Compute invoked with a batch of queue messages.
///
/// Returning `Err` fails the whole batch; returning item failures fails only those
/// messages. Either way, failed messages are redelivered once their visibility window
/// expires.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle_batch(&self, event: &QueueEvent) -> Result<BatchResponse>;
}
