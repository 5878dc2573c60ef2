use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
};
use std::sync::Arc;

use super::memory::RecordStore;
use super::protocol::{
    DEFAULT_SCAN_LIMIT, GetRecordResponse, MAX_SCAN_LIMIT, ScanParams, ScanResponse,
};

pub async fn handle_get_record(
    Extension(store): Extension<Arc<dyn RecordStore>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<GetRecordResponse>) {
    let partition_key = store.schema().partition_key.clone();

    match store.get(&key).await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(GetRecordResponse {
                item: Some(record.to_item(&partition_key)),
            }),
        ),
        Ok(None) => (StatusCode::NOT_FOUND, Json(GetRecordResponse { item: None })),
        Err(e) => {
            tracing::error!("Failed to get record {}: {}", key, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(GetRecordResponse { item: None }),
            )
        }
    }
}

pub async fn handle_scan_records(
    Extension(store): Extension<Arc<dyn RecordStore>>,
    Query(params): Query<ScanParams>,
) -> (StatusCode, Json<Option<ScanResponse>>) {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SCAN_LIMIT)
        .min(MAX_SCAN_LIMIT);
    let schema = store.schema().clone();

    let scanned = match store.scan(limit).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Failed to scan {}: {}", schema.table_name, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(None));
        }
    };
    let total_count = store.count().await.unwrap_or(scanned.len());

    let items: Vec<_> = scanned
        .iter()
        .map(|record| record.to_item(&schema.partition_key))
        .collect();

    (
        StatusCode::OK,
        Json(Some(ScanResponse {
            table: schema,
            total_count,
            count: items.len(),
            items,
        })),
    )
}
