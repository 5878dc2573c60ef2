//! Invocable Functions Module
//!
//! Hosts the units of compute that can be called on demand with a JSON event,
//! standing in for a serverless function runtime.
//!
//! ## Submodules
//! - **`registry`**: Name -> closure mapping with per-function deadlines.
//! - **`handlers`**: HTTP endpoints to list and invoke functions.
//! - **`types`**: The `{ statusCode, body }` response envelope.

pub mod handlers;
pub mod registry;
pub mod types;
