//! Error types shared by the pipeline components.
//!
//! Component seams (queue, store, configuration, function invocation) return these typed
//! errors. Handler code built on top of them uses `anyhow` and converts with `?`.

use crate::queue::types::MessageId;

/// Failures of a [`MessageQueue`](crate::queue::queue::MessageQueue) operation.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    /// The receipt belongs to an earlier delivery of the message.
    #[error("Receipt handle is no longer valid for message {0}")]
    StaleReceipt(MessageId),

    #[error("Malformed receipt handle: {0}")]
    MalformedReceipt(String),

    #[error("Queue unavailable: {0}")]
    Unavailable(String),
}

/// Failures of a [`RecordStore`](crate::store::memory::RecordStore) operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid key: partition key '{0}' must be a non-empty string")]
    InvalidKey(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures of a function invocation through the
/// [`FunctionRegistry`](crate::functions::registry::FunctionRegistry).
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Function {name} timed out after {timeout_ms} ms")]
    Timeout { name: String, timeout_ms: u64 },

    #[error("Function {name} failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}
