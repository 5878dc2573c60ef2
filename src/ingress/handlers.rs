use super::cors::preflight_headers;
use crate::queue::queue::MessageQueue;

use axum::Extension;
use axum::body::Bytes;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Header carrying the id of the enqueued message.
pub const MESSAGE_ID_HEADER: &str = "x-message-id";

/// Enqueues the request body verbatim as one message.
///
/// Returns as soon as the queue has accepted it, never waiting for processing.
pub async fn handle_send(
    Extension(queue): Extension<Arc<dyn MessageQueue>>,
    body: Bytes,
) -> Response {
    let size = body.len();

    match queue.send(body).await {
        Ok(message_id) => {
            tracing::debug!("Ingress enqueued message {} ({} bytes)", message_id, size);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/json".to_string()),
                    (
                        header::HeaderName::from_static(MESSAGE_ID_HEADER),
                        message_id.0,
                    ),
                ],
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Ingress failed to enqueue message: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn handle_preflight() -> impl IntoResponse {
    (StatusCode::OK, preflight_headers())
}
