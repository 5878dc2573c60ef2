//! Message Relay Library
//!
//! This library crate defines the components of a self-hosted message relay pipeline.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! A request travels ingress -> queue -> consumer -> store:
//!
//! - **`ingress`**: The public HTTP resource. A POST enqueues the body verbatim, an OPTIONS
//!   preflight gets a fixed cross-origin answer.
//! - **`queue`**: The durable buffer. At-least-once delivery with a visibility window and
//!   optional dead-lettering.
//! - **`consumer`**: The poller and worker pool that feed queue batches to the handler that
//!   upserts user responses.
//! - **`store`**: The key-value table holding one record per user.
//! - **`reporting`**: An on-demand producer of random submissions that posts to the ingress.
//! - **`functions`**: The registry through which the consumer and reporting handlers can be
//!   invoked directly.
//! - **`analytics`**: Declared named queries over the exported logs.
//! - **`config`** / **`server`**: Configuration and assembly of the running service.

pub mod analytics;
pub mod config;
pub mod consumer;
pub mod error;
pub mod functions;
pub mod ingress;
pub mod queue;
pub mod reporting;
pub mod server;
pub mod store;
