use crate::config::{APPLICATION_ID_CONFIG, AppConfig, KafkaStreamsConfig};
use crossbeam_channel::{Receiver, TryRecvError};
use rdkafka::ClientConfig;
use rdkafka::Message;
use rdkafka::consumer::{Consumer, StreamConsumer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, error_span, info, info_span};

/// How long a single receive waits before the shutdown signal is checked again, and
/// the pause after a failed receive.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct SpanConsumer {
    config: Arc<AppConfig>,
    consumer: StreamConsumer,
}

impl SpanConsumer {
    pub fn new(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let consumer = stream_consumer(&config.kafka_streams)?;
        consumer.subscribe(&[config.kafka_streams.topics.spans.as_str()])?;

        info_span!(
            "consumer_subscribed",
            topic = %config.kafka_streams.topics.spans,
            group = %config.kafka_streams.application_id,
        )
        .in_scope(|| info!("Subscribed to span topic"));

        Ok(Self { config, consumer })
    }

    /// Receives span records until `shutdown_rx` fires or its sender is dropped.
    /// Returns the number of records received.
    pub async fn consume_loop(&self, shutdown_rx: Receiver<()>) -> anyhow::Result<u64> {
        let mut received = 0u64;

        loop {
            match shutdown_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            match tokio::time::timeout(POLL_INTERVAL, self.consumer.recv()).await {
                Err(_) => continue,
                Ok(Ok(message)) => {
                    received += 1;
                    debug!(
                        topic = message.topic(),
                        partition = message.partition(),
                        offset = message.offset(),
                        bytes = message.payload_len(),
                        format = %self.config.format,
                        "span record received"
                    );
                }
                Ok(Err(e)) => {
                    error_span!(
                        "kafka_receive_error",
                        error = %e,
                        topic = %self.config.kafka_streams.topics.spans,
                    )
                    .in_scope(|| error!("Failed to receive span record"));
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }

        Ok(received)
    }
}

/// Translates the stream processor properties into librdkafka settings. librdkafka
/// has no application id, so it becomes the consumer group.
pub fn client_config(config: &KafkaStreamsConfig) -> ClientConfig {
    let mut cfg = ClientConfig::new();
    for (key, value) in config.properties() {
        let key = if key == APPLICATION_ID_CONFIG {
            "group.id"
        } else {
            key
        };
        cfg.set(key, value);
    }
    cfg.set("client.id", &config.application_id)
        .set("enable.partition.eof", "false");
    cfg
}

fn stream_consumer(config: &KafkaStreamsConfig) -> anyhow::Result<StreamConsumer> {
    client_config(config).create().map_err(|e| e.into())
}
