//! Record Store Module
//!
//! The persistent key-value table the consumer writes into.
//!
//! ## Core Concepts
//! - **Schema**: A single string partition key, no sort key, on-demand capacity.
//! - **Upsert**: `update` overwrites the named attributes and creates missing records.
//! - **Isolation**: Writes lock only the entry they touch, so writers of different keys
//!   never interfere.
//! - **Access**: `RecordStore` is a trait so consumers can be tested against any backend.

pub mod handlers;
pub mod memory;
pub mod protocol;
pub mod types;

#[cfg(test)]
mod tests;
