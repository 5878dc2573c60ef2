//! Service configuration.
//!
//! Every option has a command line flag and a `RELAY_*` environment variable. Defaults
//! reproduce the reference deployment: one `randomdata` resource feeding the
//! `randomdataqueue` queue, consumed into the `acn_db_user` table.

use crate::analytics::queries::AnalyticsSettings;
use crate::consumer::poller::ConsumerSettings;
use crate::consumer::user_response::{RESPONSE_FIELD, VERSION_FIELD};
use crate::error::ConfigError;
use crate::queue::queue::RedrivePolicy;

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Largest batch a single consumer invocation may receive.
pub const MAX_BATCH_SIZE: usize = 10;

/// Top-level segments already taken by the service's own endpoints.
pub const RESERVED_PATHS: &[&str] = &["functions", "records", "topology", "queue", "analytics"];

#[derive(Parser, Debug, Clone)]
#[command(name = "relay")]
#[command(about = "Ingress -> queue -> consumer -> store message relay")]
pub struct RelayConfig {
    /// Address the HTTP server binds to
    #[arg(long, env = "RELAY_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Path segment of the ingress resource (POST /{resource_path})
    #[arg(long, env = "RELAY_RESOURCE_PATH", default_value = "randomdata")]
    pub resource_path: String,

    #[arg(long, env = "RELAY_QUEUE_NAME", default_value = "randomdataqueue")]
    pub queue_name: String,

    /// Seconds a received message stays hidden from other consumers
    #[arg(long, env = "RELAY_VISIBILITY_TIMEOUT_SECS", default_value_t = 65)]
    pub visibility_timeout_secs: u64,

    /// Dead-letter a message after this many receives (unlimited when unset)
    #[arg(long, env = "RELAY_MAX_RECEIVE_COUNT")]
    pub max_receive_count: Option<u32>,

    #[arg(long, env = "RELAY_TABLE_NAME", default_value = "acn_db_user")]
    pub table_name: String,

    #[arg(long, env = "RELAY_PARTITION_KEY", default_value = "userid")]
    pub partition_key: String,

    #[arg(long, env = "RELAY_CONSUMER_TIMEOUT_SECS", default_value_t = 60)]
    pub consumer_timeout_secs: u64,

    #[arg(long, env = "RELAY_REPORTING_TIMEOUT_SECS", default_value_t = 60)]
    pub reporting_timeout_secs: u64,

    /// Messages per consumer invocation (1..=10)
    #[arg(long, env = "RELAY_BATCH_SIZE", default_value_t = 10)]
    pub batch_size: usize,

    /// Concurrent consumer invocations
    #[arg(long, env = "RELAY_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Pause before polling again after an empty receive
    #[arg(long, env = "RELAY_POLL_INTERVAL_MS", default_value_t = 100)]
    pub poll_interval_ms: u64,

    /// Where the reporting function posts its rounds (defaults to our own ingress URL)
    #[arg(long, env = "RELAY_REPORTING_ENDPOINT")]
    pub reporting_endpoint: Option<String>,

    /// `Version` stamped on every generated report record
    #[arg(long, env = "RELAY_REPORT_VERSION", default_value = "your_version_here")]
    pub report_version: String,

    #[arg(long, env = "RELAY_ANALYTICS_DATABASE", default_value = "cdk_cloudwatch_logs")]
    pub analytics_database: String,

    #[arg(long, env = "RELAY_ANALYTICS_TABLE", default_value = "your_table_name")]
    pub analytics_table: String,

    #[arg(
        long,
        env = "RELAY_ANALYTICS_LOCATION",
        default_value = "s3://cdk-athena-cw-logs-1709/path/"
    )]
    pub analytics_location: String,

    /// Default tracing filter; `RUST_LOG` takes precedence
    #[arg(long, env = "RELAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::parse_from(["relay"])
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }

        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(ConfigError::Invalid(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }

        if self.resource_path.is_empty() || self.resource_path.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "resource path must be a single non-empty segment, got '{}'",
                self.resource_path
            )));
        }

        if RESERVED_PATHS.contains(&self.resource_path.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "resource path '{}' collides with a built-in endpoint",
                self.resource_path
            )));
        }

        if self.partition_key.is_empty() {
            return Err(ConfigError::Invalid("partition key must not be empty".into()));
        }

        if [VERSION_FIELD, RESPONSE_FIELD].contains(&self.partition_key.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "partition key '{}' collides with a stored attribute",
                self.partition_key
            )));
        }

        // A message must stay hidden for as long as one invocation may hold it.
        if self.visibility_timeout_secs < self.consumer_timeout_secs {
            return Err(ConfigError::Invalid(format!(
                "visibility timeout ({}s) is shorter than the consumer timeout ({}s)",
                self.visibility_timeout_secs, self.consumer_timeout_secs
            )));
        }

        if self.max_receive_count == Some(0) {
            return Err(ConfigError::Invalid(
                "max receive count must be at least 1 when set".into(),
            ));
        }

        Ok(())
    }

    /// Public URL of the ingress resource for a server bound to `addr`.
    pub fn ingress_url(&self, addr: SocketAddr) -> String {
        format!("http://{}/{}", addr, self.resource_path)
    }

    pub fn reporting_endpoint_for(&self, addr: SocketAddr) -> String {
        self.reporting_endpoint
            .clone()
            .unwrap_or_else(|| self.ingress_url(addr))
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    pub fn consumer_timeout(&self) -> Duration {
        Duration::from_secs(self.consumer_timeout_secs)
    }

    pub fn reporting_timeout(&self) -> Duration {
        Duration::from_secs(self.reporting_timeout_secs)
    }

    pub fn redrive_policy(&self) -> RedrivePolicy {
        RedrivePolicy {
            max_receive_count: self.max_receive_count,
        }
    }

    pub fn consumer_settings(&self) -> ConsumerSettings {
        ConsumerSettings {
            batch_size: self.batch_size,
            workers: self.workers,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            invocation_timeout: self.consumer_timeout(),
        }
    }

    pub fn analytics_settings(&self) -> AnalyticsSettings {
        AnalyticsSettings {
            database: self.analytics_database.clone(),
            table: self.analytics_table.clone(),
            location: self.analytics_location.clone(),
        }
    }
}
