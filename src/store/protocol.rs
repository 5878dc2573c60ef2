//! Store Inspection Protocol
//!
//! Endpoints and DTOs used to read table contents over HTTP.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::TableSchema;

/// Public endpoint for scanning records.
pub const ENDPOINT_RECORDS: &str = "/records";

pub const DEFAULT_SCAN_LIMIT: usize = 100;
pub const MAX_SCAN_LIMIT: usize = 1_000;

#[derive(Debug, Deserialize)]
pub struct ScanParams {
    pub limit: Option<usize>,
}

/// Response for a single-record lookup. `item` is `None` when the key does not exist.
#[derive(Debug, Serialize)]
pub struct GetRecordResponse {
    pub item: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub table: TableSchema,
    pub total_count: usize,
    pub count: usize,
    pub items: Vec<Map<String, Value>>,
}
