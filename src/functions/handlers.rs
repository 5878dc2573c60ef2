use super::registry::FunctionRegistry;
use super::types::FunctionInfo;
use crate::error::InvokeError;

use axum::{Extension, Json, extract::Path, http::StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;

pub const ENDPOINT_FUNCTIONS: &str = "/functions";

pub async fn handle_invoke(
    Extension(registry): Extension<Arc<FunctionRegistry>>,
    Path(name): Path<String>,
    Json(event): Json<Value>,
) -> (StatusCode, Json<Value>) {
    match registry.invoke(&name, event).await {
        Ok(result) => {
            tracing::info!("Function {} invoked successfully", name);
            (StatusCode::OK, Json(result))
        }
        Err(e) => {
            let status = match &e {
                InvokeError::UnknownFunction(_) => StatusCode::NOT_FOUND,
                InvokeError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                InvokeError::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::error!("Invocation of {} failed: {:#}", name, e);
            (status, Json(json!({ "errorMessage": e.to_string() })))
        }
    }
}

pub async fn handle_list_functions(
    Extension(registry): Extension<Arc<FunctionRegistry>>,
) -> Json<Vec<FunctionInfo>> {
    Json(registry.list_functions())
}
