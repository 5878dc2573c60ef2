//! Reporting Module Tests

#[cfg(test)]
mod tests {
    use crate::reporting::generator::{ReportGenerator, generate_round};
    use crate::reporting::sink::ReportSink;
    use crate::reporting::types::{ReportRecord, ReportRequest, SinkResponse};

    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Records every published round and answers with a fixed status.
    struct RecordingSink {
        status: u16,
        rounds: Mutex<Vec<Vec<ReportRecord>>>,
    }

    impl RecordingSink {
        fn new(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status,
                rounds: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ReportSink for RecordingSink {
        async fn publish(&self, records: &[ReportRecord]) -> anyhow::Result<SinkResponse> {
            self.rounds.lock().await.push(records.to_vec());
            Ok(SinkResponse {
                status: self.status,
                body: "endpoint says no".to_string(),
            })
        }
    }

    struct BrokenSink;

    #[async_trait]
    impl ReportSink for BrokenSink {
        async fn publish(&self, _records: &[ReportRecord]) -> anyhow::Result<SinkResponse> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    // ============================================================
    // REQUEST PARSING
    // ============================================================

    #[test]
    fn test_request_accepts_numbers_and_numeric_strings() {
        assert_eq!(
            ReportRequest::from_event(&json!({"N": 3, "M": 5})),
            Some(ReportRequest { n: 3, m: 5 })
        );
        assert_eq!(
            ReportRequest::from_event(&json!({"N": "2", "M": " 7 "})),
            Some(ReportRequest { n: 2, m: 7 })
        );
        assert!(ReportRequest::from_event(&json!({"N": 3})).is_none());
        assert!(ReportRequest::from_event(&json!({"N": "three", "M": 1})).is_none());
    }

    #[test]
    fn test_request_truncates_fractions_and_floors_negatives() {
        assert_eq!(
            ReportRequest::from_event(&json!({"N": 2.0, "M": 3.9})),
            Some(ReportRequest { n: 2, m: 3 })
        );
        assert_eq!(
            ReportRequest::from_event(&json!({"N": -1, "M": "-4"})),
            Some(ReportRequest { n: 0, m: 0 })
        );
        assert!(ReportRequest::from_event(&json!({"N": "2.0", "M": 1})).is_none());
        assert!(ReportRequest::from_event(&json!({"N": true, "M": 1})).is_none());
    }

    #[tokio::test]
    async fn test_zero_rounds_publishes_nothing() {
        let sink = RecordingSink::new(200);
        let generator = ReportGenerator::new(sink.clone(), "v1");

        let response = generator.run(json!({"N": -2, "M": 5})).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body["output_data"], json!([]));
        assert!(sink.rounds.lock().await.is_empty());
    }

    // ============================================================
    // GENERATION
    // ============================================================

    #[test]
    fn test_generated_records_have_expected_shape() {
        let records = generate_round(200, "v42");
        assert_eq!(records.len(), 200);

        for record in &records {
            assert_eq!(record.version, "v42");
            assert_eq!(record.userid.len(), 6);
            assert!(record.userid.chars().all(|c| c.is_ascii_alphanumeric()));

            let questions = record.response.len();
            assert!((1..=10).contains(&questions));
            for idx in 1..=questions {
                let answer = record.response[&format!("q{}", idx)].as_str().unwrap();
                assert!(["value1", "value2", "value3"].contains(&answer));
            }
        }
    }

    #[test]
    fn test_record_serializes_with_version_key() {
        let record = &generate_round(1, "your_version_here")[0];
        let value = serde_json::to_value(record).unwrap();

        assert_eq!(value["Version"], "your_version_here");
        assert!(value["userid"].is_string());
        assert!(value["response"].is_object());
    }

    // ============================================================
    // RUN
    // ============================================================

    #[tokio::test]
    async fn test_missing_parameters_return_400() {
        let generator = ReportGenerator::new(RecordingSink::new(200), "v1");

        let response = generator.run(json!({"M": 4})).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, json!("Please provide M and N values."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_publishes_n_rounds_of_m_records() {
        let sink = RecordingSink::new(200);
        let generator = ReportGenerator::new(sink.clone(), "v1");

        let started = tokio::time::Instant::now();
        let response = generator.run(json!({"N": 3, "M": 4})).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body["message"], "Data sent successfully");
        assert_eq!(response.body["output_data"].as_array().unwrap().len(), 12);

        let rounds = sink.rounds.lock().await;
        assert_eq!(rounds.len(), 3);
        assert!(rounds.iter().all(|round| round.len() == 4));

        // Rounds are one second apart.
        assert_eq!(started.elapsed().as_secs(), 2);
    }

    #[tokio::test]
    async fn test_rejected_round_returns_endpoint_status() {
        let sink = RecordingSink::new(503);
        let generator = ReportGenerator::new(sink.clone(), "v1");

        let response = generator.run(json!({"N": 5, "M": 1})).await;

        assert_eq!(response.status_code, 503);
        assert_eq!(response.body["details"], "endpoint says no");
        assert_eq!(sink.rounds.lock().await.len(), 1, "stops after the first rejection");
    }

    #[tokio::test]
    async fn test_transport_failure_returns_500() {
        let generator = ReportGenerator::new(Arc::new(BrokenSink), "v1");

        let response = generator.run(json!({"N": 1, "M": 1})).await;

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body["error"], "Exception occurred");
        assert!(
            response.body["details"]
                .as_str()
                .unwrap()
                .contains("connection refused")
        );
    }
}
