//! Reporting Module
//!
//! The independently invoked load/report producer. It is not part of the ingress path:
//! it is called on demand through the function registry and talks to the ingress
//! endpoint over HTTP like any other client.
//!
//! ## Submodules
//! - **`generator`**: Random submission generation and the round loop.
//! - **`sink`**: Where rounds are published (HTTP by default).
//! - **`types`**: Request parsing and record types.

pub mod generator;
pub mod sink;
pub mod types;

#[cfg(test)]
mod tests;
