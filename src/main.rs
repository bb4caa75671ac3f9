use std::sync::Arc;
use tracing::{error, error_span, info};
use tracing_subscriber::{fmt, prelude::*};
use zipkin_dependencies_streaming::config::AppConfig;
use zipkin_dependencies_streaming::kafka::SpanConsumer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logger();

    let config = match AppConfig::new() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error_span!("config_error", error = %e).in_scope(|| error!("Invalid configuration"));
            return Err(e);
        }
    };
    info!(
        config = %serde_json::to_string(config.as_ref())?,
        "Configuration loaded"
    );

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

    // Handle SIGINT
    {
        let shutdown_tx = shutdown_tx.clone();
        ctrlc::set_handler(move || {
            let _ = shutdown_tx.send(());
        })?;
    }

    let consumer = SpanConsumer::new(config.clone())?;
    let received = consumer.consume_loop(shutdown_rx).await?;
    info!(received, "Span consumer stopped");

    Ok(())
}

fn init_logger() {
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
