//! Queue Consumer Module
//!
//! Implements the queue-triggered side of the pipeline: batches pulled from the queue are
//! handed to a consumer handler, which writes records into the store.
//!
//! ## Architecture Overview
//! 1. **Polling**: `QueueConsumer` pulls batches and dispatches them to worker tasks.
//! 2. **Handling**: A `BatchHandler` transforms each message and reports per-item failures.
//! 3. **Acknowledgement**: Handled messages are deleted; failures wait out their visibility
//!    window and are redelivered (at-least-once).
//!
//! ## Submodules
//! - **`handler`**: The `BatchHandler` trait.
//! - **`poller`**: Poller + worker pool.
//! - **`user_response`**: The handler that upserts user survey responses.
//! - **`types`**: Queue event, batch response and report types.

pub mod handler;
pub mod poller;
pub mod types;
pub mod user_response;
