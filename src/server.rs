//! Service assembly.
//!
//! Builds every component from a [`RelayConfig`], registers the invocable functions, and
//! serves the HTTP surface while the consumer drains the queue in the background.

use crate::analytics::handlers::{ENDPOINT_QUERIES, handle_get_query, handle_list_queries};
use crate::analytics::queries::QueryCatalog;
use crate::config::RelayConfig;
use crate::consumer::poller::QueueConsumer;
use crate::consumer::user_response::UserResponseHandler;
use crate::functions::handlers::{ENDPOINT_FUNCTIONS, handle_invoke, handle_list_functions};
use crate::functions::registry::FunctionRegistry;
use crate::functions::types::FunctionInfo;
use crate::ingress;
use crate::queue::handlers::{handle_dead_letters, handle_queue_attributes};
use crate::queue::protocol::{ENDPOINT_QUEUE_ATTRIBUTES, ENDPOINT_QUEUE_DEAD_LETTERS};
use crate::queue::queue::{InMemoryQueue, MessageQueue};
use crate::reporting::generator::ReportGenerator;
use crate::reporting::sink::HttpSink;
use crate::store::handlers::{handle_get_record, handle_scan_records};
use crate::store::memory::{InMemoryStore, RecordStore};
use crate::store::protocol::ENDPOINT_RECORDS;
use crate::store::types::TableSchema;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::Extension,
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const FN_RANDOM_REPORTING: &str = "random_reporting";
pub const FN_QUEUE_CONSUMER: &str = "sqs_consumer";

pub const ENDPOINT_TOPOLOGY: &str = "/topology";

/// The declared resources of a running service.
#[derive(Debug, Clone, Serialize)]
pub struct Topology {
    pub ingress: IngressTopology,
    pub queue: QueueTopology,
    pub table: TableSchema,
    pub functions: Vec<FunctionInfo>,
    pub event_source: EventSourceTopology,
    pub queries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngressTopology {
    pub path: String,
    pub methods: Vec<&'static str>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueTopology {
    pub name: String,
    pub visibility_timeout_seconds: u64,
    pub max_receive_count: Option<u32>,
}

/// Wiring between the queue and the consumer function.
#[derive(Debug, Clone, Serialize)]
pub struct EventSourceTopology {
    pub queue: String,
    pub function: String,
    pub batch_size: usize,
    pub workers: usize,
}

/// Every component of one service instance.
pub struct Relay {
    pub queue: Arc<InMemoryQueue>,
    pub store: Arc<InMemoryStore>,
    pub registry: Arc<FunctionRegistry>,
    pub catalog: Arc<QueryCatalog>,
    pub consumer: Arc<QueueConsumer>,
    pub topology: Arc<Topology>,
}

impl Relay {
    /// Builds the components for a server reachable at `local_addr`.
    pub fn build(config: &RelayConfig, local_addr: SocketAddr) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(InMemoryQueue::with_redrive(
            config.queue_name.clone(),
            config.visibility_timeout(),
            config.redrive_policy(),
        ));
        let store = Arc::new(InMemoryStore::new(TableSchema::new(
            config.table_name.clone(),
            config.partition_key.clone(),
        )));
        let catalog = Arc::new(QueryCatalog::new(&config.analytics_settings()));

        let handler = Arc::new(UserResponseHandler::new(store.clone()));
        let registry = FunctionRegistry::new();

        let endpoint = config.reporting_endpoint_for(local_addr);
        tracing::info!("Reporting function publishes to {}", endpoint);
        let generator = Arc::new(ReportGenerator::new(
            Arc::new(HttpSink::new(endpoint)),
            config.report_version.clone(),
        ));
        registry.register(FN_RANDOM_REPORTING, config.reporting_timeout(), move |event| {
            let generator = generator.clone();
            async move { Ok::<_, anyhow::Error>(serde_json::to_value(generator.run(event).await)?) }
        });

        let direct = handler.clone();
        registry.register(FN_QUEUE_CONSUMER, config.consumer_timeout(), move |event| {
            let handler = direct.clone();
            async move { handler.handle_event(event).await }
        });

        let consumer = QueueConsumer::new(queue.clone(), handler, config.consumer_settings());

        let topology = Arc::new(Topology {
            ingress: IngressTopology {
                path: format!("/{}", config.resource_path),
                methods: vec!["POST", "OPTIONS"],
                url: config.ingress_url(local_addr),
            },
            queue: QueueTopology {
                name: config.queue_name.clone(),
                visibility_timeout_seconds: config.visibility_timeout_secs,
                max_receive_count: config.max_receive_count,
            },
            table: store.schema().clone(),
            functions: registry.list_functions(),
            event_source: EventSourceTopology {
                queue: config.queue_name.clone(),
                function: FN_QUEUE_CONSUMER.to_string(),
                batch_size: config.batch_size,
                workers: config.workers,
            },
            queries: catalog.list().iter().map(|q| q.name.clone()).collect(),
        });

        Ok(Self {
            queue,
            store,
            registry,
            catalog,
            consumer,
            topology,
        })
    }

    pub fn router(&self, resource_path: &str) -> Router {
        let queue: Arc<dyn MessageQueue> = self.queue.clone();
        let store: Arc<dyn RecordStore> = self.store.clone();

        ingress::router(resource_path)
            .route(ENDPOINT_QUEUE_ATTRIBUTES, get(handle_queue_attributes))
            .route(ENDPOINT_QUEUE_DEAD_LETTERS, get(handle_dead_letters))
            .route(ENDPOINT_RECORDS, get(handle_scan_records))
            .route(&format!("{}/:id", ENDPOINT_RECORDS), get(handle_get_record))
            .route(ENDPOINT_FUNCTIONS, get(handle_list_functions))
            .route(&format!("{}/:name/invoke", ENDPOINT_FUNCTIONS), post(handle_invoke))
            .route(ENDPOINT_QUERIES, get(handle_list_queries))
            .route(&format!("{}/:name", ENDPOINT_QUERIES), get(handle_get_query))
            .route(ENDPOINT_TOPOLOGY, get(handle_topology))
            .layer(Extension(queue))
            .layer(Extension(store))
            .layer(Extension(self.registry.clone()))
            .layer(Extension(self.catalog.clone()))
            .layer(Extension(self.topology.clone()))
    }
}

async fn handle_topology(Extension(topology): Extension<Arc<Topology>>) -> Json<Topology> {
    Json(topology.as_ref().clone())
}

/// Serves on `listener` until `shutdown` is cancelled, then drains the consumer.
pub async fn serve(config: RelayConfig, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
    let local_addr = listener.local_addr()?;
    let relay = Relay::build(&config, local_addr)?;

    let consumer = relay.consumer.clone().start(shutdown.clone());
    let app = relay.router(&config.resource_path);

    tracing::info!("HTTP server listening on {}", local_addr);
    tracing::info!("Ingress resource: POST {}", config.ingress_url(local_addr));

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { signal.cancelled().await })
        .await?;

    // The server can also stop on its own; make sure the consumer follows.
    shutdown.cancel();
    consumer.wait().await;

    tracing::info!("Relay stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use clap::Parser;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn relay() -> (RelayConfig, Relay) {
        let config = RelayConfig::try_parse_from(["relay"]).unwrap();
        let addr: SocketAddr = "127.0.0.1:3000".parse().unwrap();
        let relay = Relay::build(&config, addr).unwrap();
        (config, relay)
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = RelayConfig::try_parse_from(["relay", "--workers", "0"]).unwrap();
        let addr: SocketAddr = "127.0.0.1:3000".parse().unwrap();
        assert!(Relay::build(&config, addr).is_err());
    }

    #[tokio::test]
    async fn test_topology_lists_declared_resources() {
        let (config, relay) = relay();

        let (status, body) = call(
            relay.router(&config.resource_path),
            Request::get("/topology").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ingress"]["path"], "/randomdata");
        assert_eq!(body["ingress"]["url"], "http://127.0.0.1:3000/randomdata");
        assert_eq!(body["queue"]["name"], "randomdataqueue");
        assert_eq!(body["queue"]["visibility_timeout_seconds"], 65);
        assert_eq!(body["table"]["table_name"], "acn_db_user");
        assert_eq!(body["event_source"]["function"], FN_QUEUE_CONSUMER);
        assert_eq!(body["functions"].as_array().unwrap().len(), 2);
        assert_eq!(body["queries"], json!(["CreateDatabase", "CreateExternalTable"]));
    }

    #[tokio::test]
    async fn test_direct_consumer_invocation_writes_record() {
        let (config, relay) = relay();
        let app = relay.router(&config.resource_path);

        let event = json!({
            "Records": [
                { "messageId": "m-1", "body": r#"{"userid":"u1","Version":"v1","response":{"q1":"value2"}}"# }
            ]
        });
        let (status, body) = call(
            app.clone(),
            Request::post("/functions/sqs_consumer/invoke")
                .header("content-type", "application/json")
                .body(Body::from(event.to_string()))
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["batchItemFailures"], json!([]));

        let (status, body) = call(
            app,
            Request::get("/records/u1").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["item"]["userid"], "u1");
        assert_eq!(body["item"]["Version"], "v1");
        assert_eq!(body["item"]["response"]["q1"], "value2");
    }

    #[tokio::test]
    async fn test_analytics_queries_are_served() {
        let (config, relay) = relay();
        let app = relay.router(&config.resource_path);

        let (status, body) = call(
            app.clone(),
            Request::get("/analytics/queries/CreateDatabase")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["query_string"],
            "CREATE DATABASE IF NOT EXISTS cdk_cloudwatch_logs;"
        );

        let (status, _) = call(
            app,
            Request::get("/analytics/queries/Nope").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
