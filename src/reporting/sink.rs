use super::types::{ReportRecord, SinkResponse};

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Destination of generated report rounds.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Publishes one round. `Err` means the request never completed.
    async fn publish(&self, records: &[ReportRecord]) -> Result<SinkResponse>;
}

/// Posts each round as a JSON array to an HTTP endpoint.
pub struct HttpSink {
    endpoint: String,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReportSink for HttpSink {
    async fn publish(&self, records: &[ReportRecord]) -> Result<SinkResponse> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(records)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        tracing::debug!(
            "Published {} records to {} -> {}",
            records.len(),
            self.endpoint,
            status
        );

        Ok(SinkResponse { status, body })
    }
}
