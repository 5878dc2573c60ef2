use super::protocol::*;
use super::queue::MessageQueue;

use axum::{Extension, Json};
use std::sync::Arc;

pub async fn handle_queue_attributes(
    Extension(queue): Extension<Arc<dyn MessageQueue>>,
) -> Json<QueueAttributesResponse> {
    Json(QueueAttributesResponse {
        attributes: queue.attributes(),
    })
}

pub async fn handle_dead_letters(
    Extension(queue): Extension<Arc<dyn MessageQueue>>,
) -> Json<DeadLettersResponse> {
    let dead_letters = queue.dead_letters();
    tracing::debug!("Dead-letter query: {} messages", dead_letters.len());

    Json(DeadLettersResponse {
        count: dead_letters.len(),
        dead_letters,
    })
}
