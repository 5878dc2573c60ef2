//! Message Queue Module
//!
//! The durable buffer between the ingress endpoint and the consumer.
//!
//! ## Semantics
//! 1. **At-least-once**: A message stays in the queue until a consumer deletes it.
//! 2. **Visibility window**: A received message is hidden from other consumers for the
//!    configured timeout. If it is not deleted in time it becomes visible again.
//! 3. **No ordering, no deduplication**: Delivery order is unspecified and the same body
//!    sent twice is two messages.
//!
//! ## Submodules
//! - **`types`**: Message ids, receipt handles, entries and attributes.
//! - **`queue`**: The `MessageQueue` trait and its in-memory implementation.
//! - **`protocol`**: DTOs for the inspection endpoints.
//! - **`handlers`**: Axum handlers for the inspection endpoints.

pub mod handlers;
pub mod protocol;
pub mod queue;
pub mod types;
