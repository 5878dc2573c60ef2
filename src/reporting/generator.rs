//! Random Report Generator
//!
//! Produces synthetic survey submissions and publishes them in one-second rounds.
//! Each record gets a random 6-character alphanumeric `userid` and between one and ten
//! answers `q1..qk`, each one of `value1`, `value2` or `value3`.

use super::sink::ReportSink;
use super::types::{ReportRecord, ReportRequest};
use crate::functions::types::InvocationResponse;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;

pub const USER_ID_LEN: usize = 6;
pub const MAX_QUESTIONS: usize = 10;
pub const ANSWER_CHOICES: u32 = 3;

pub struct ReportGenerator {
    sink: Arc<dyn ReportSink>,
    version: String,
    interval: Duration,
}

impl ReportGenerator {
    pub fn new(sink: Arc<dyn ReportSink>, version: impl Into<String>) -> Self {
        Self {
            sink,
            version: version.into(),
            interval: Duration::from_secs(1),
        }
    }

    /// Overrides the pause between rounds.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs one reporting invocation and returns its `{ statusCode, body }` envelope.
    pub async fn run(&self, event: Value) -> InvocationResponse {
        let Some(request) = ReportRequest::from_event(&event) else {
            return InvocationResponse::new(400, json!("Please provide M and N values."));
        };

        tracing::info!(
            "Generating {} rounds of {} records",
            request.n,
            request.m
        );

        let mut output_data: Vec<ReportRecord> = Vec::new();

        for round in 0..request.n {
            let records = generate_round(request.m as usize, &self.version);
            output_data.extend(records.iter().cloned());

            match self.sink.publish(&records).await {
                Ok(response) if response.status == 200 => {
                    tracing::debug!("Round {} published ({} records)", round + 1, records.len());
                }
                Ok(response) => {
                    tracing::warn!(
                        "Ingress endpoint rejected round {}: {}",
                        round + 1,
                        response.status
                    );
                    return InvocationResponse::new(
                        response.status,
                        json!({
                            "error": "Failed to send data to the ingress endpoint",
                            "details": response.body,
                        }),
                    );
                }
                Err(e) => {
                    tracing::error!("Failed to publish round {}: {:#}", round + 1, e);
                    return InvocationResponse::new(
                        500,
                        json!({
                            "error": "Exception occurred",
                            "details": e.to_string(),
                        }),
                    );
                }
            }

            if round + 1 < request.n {
                tokio::time::sleep(self.interval).await;
            }
        }

        InvocationResponse::ok(json!({
            "message": "Data sent successfully",
            "output_data": output_data,
        }))
    }
}

/// Builds `count` random records tagged with `version`.
pub fn generate_round(count: usize, version: &str) -> Vec<ReportRecord> {
    let mut rng = rand::thread_rng();

    (0..count)
        .map(|_| {
            let userid: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(USER_ID_LEN)
                .map(char::from)
                .collect();

            let questions = rng.gen_range(1..=MAX_QUESTIONS);
            let mut response = Map::new();
            for idx in 1..=questions {
                let answer = rng.gen_range(1..=ANSWER_CHOICES);
                response.insert(format!("q{}", idx), json!(format!("value{}", answer)));
            }

            ReportRecord {
                version: version.to_string(),
                userid,
                response,
            }
        })
        .collect()
}
