//! Ingress Endpoint Module
//!
//! The public HTTP surface of the pipeline. It has no application logic: a POST becomes
//! exactly one queue message, and an OPTIONS preflight gets a fixed permissive
//! cross-origin answer. No validation, authentication or payload-shape checks.

pub mod cors;
pub mod handlers;

use axum::Router;
use axum::routing::post;

use handlers::{handle_preflight, handle_send};

/// Routes for `/{resource_path}`. Expects an `Arc<dyn MessageQueue>` extension layer.
pub fn router(resource_path: &str) -> Router {
    Router::new().route(
        &format!("/{}", resource_path),
        post(handle_send).options(handle_preflight),
    )
}
