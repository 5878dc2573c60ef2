use super::queries::{NamedQuery, QueryCatalog};

use axum::{Extension, Json, extract::Path, http::StatusCode};
use std::sync::Arc;

pub const ENDPOINT_QUERIES: &str = "/analytics/queries";

pub async fn handle_list_queries(
    Extension(catalog): Extension<Arc<QueryCatalog>>,
) -> Json<Vec<NamedQuery>> {
    Json(catalog.list().to_vec())
}

pub async fn handle_get_query(
    Extension(catalog): Extension<Arc<QueryCatalog>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Option<NamedQuery>>) {
    match catalog.get(&name) {
        Some(query) => (StatusCode::OK, Json(Some(query.clone()))),
        None => {
            tracing::debug!("Named query not found: {}", name);
            (StatusCode::NOT_FOUND, Json(None))
        }
    }
}
