//! Queue Inspection Protocol
//!
//! Endpoints and DTOs for looking at queue state from outside the process.
//! Producers never use these: they go through the ingress endpoint.

use super::types::{DeadLetter, QueueAttributes};
use serde::Serialize;

pub const ENDPOINT_QUEUE_ATTRIBUTES: &str = "/queue/attributes";
pub const ENDPOINT_QUEUE_DEAD_LETTERS: &str = "/queue/dead-letters";

#[derive(Debug, Serialize)]
pub struct QueueAttributesResponse {
    #[serde(rename = "Attributes")]
    pub attributes: QueueAttributes,
}

#[derive(Debug, Serialize)]
pub struct DeadLettersResponse {
    pub count: usize,
    pub dead_letters: Vec<DeadLetter>,
}
