use crate::error::ConfigError;
use crate::source::{self, ConfigSource};
use crate::storage::StorageConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

pub const BOOTSTRAP_SERVERS_CONFIG: &str = "bootstrap.servers";
pub const APPLICATION_ID_CONFIG: &str = "application.id";
pub const AUTO_OFFSET_RESET_CONFIG: &str = "auto.offset.reset";

/// Span history is always replayed from the start of the topic.
const AUTO_OFFSET_RESET: &str = "earliest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    pub kafka_streams: KafkaStreamsConfig,
    pub format: String,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Loads the configuration file and environment overrides, then builds.
    pub fn new() -> anyhow::Result<Self> {
        let source = source::load_from_env()?;
        Self::build(&source).map_err(Into::into)
    }

    /// Assembles the whole configuration from `source`. Stops at the first missing or
    /// invalid key; storage keys are only read for the selected backend.
    pub fn build(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        let topics = Topics {
            spans: required(source, "kafka-streams.topics.spans")?,
        };
        let kafka_streams = KafkaStreamsConfig {
            bootstrap_servers: required(source, "kafka-streams.bootstrap-servers")?,
            application_id: required(source, "kafka-streams.application-id")?,
            topics,
        };
        let storage = StorageConfig::read(source)?;
        let format = required(source, "format")?;

        debug!(storage_type = %storage.storage_type(), format = %format, "configuration built");

        Ok(Self {
            kafka_streams,
            format,
            storage,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KafkaStreamsConfig {
    pub bootstrap_servers: String,
    pub application_id: String,
    pub topics: Topics,
}

impl KafkaStreamsConfig {
    /// Client properties for the stream processor.
    pub fn properties(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            (BOOTSTRAP_SERVERS_CONFIG, self.bootstrap_servers.clone()),
            (APPLICATION_ID_CONFIG, self.application_id.clone()),
            (AUTO_OFFSET_RESET_CONFIG, AUTO_OFFSET_RESET.to_owned()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topics {
    pub spans: String,
}

fn required(source: &impl ConfigSource, path: &str) -> Result<String, ConfigError> {
    let value = source.get_string(path)?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue {
            path: path.to_owned(),
        });
    }
    Ok(value)
}
