use clap::Parser;
use message_relay::config::RelayConfig;
use message_relay::server;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate()?;

    tracing::info!("Starting relay on {}", config.bind);
    tracing::info!(
        "Queue {} -> table {} ({} workers, batch size {})",
        config.queue_name,
        config.table_name,
        config.workers,
        config.batch_size
    );

    let listener = tokio::net::TcpListener::bind(config.bind).await?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown requested");
        signal.cancel();
    });

    tracing::info!("Press Ctrl+C to shutdown");
    server::serve(config, listener, shutdown).await
}
