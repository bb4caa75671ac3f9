use crate::error::ConfigError;
use thiserror::Error;

/// File stem looked up when `CONFIG_FILE` is not set. Any extension the `config`
/// crate understands is accepted.
pub const DEFAULT_CONFIG_FILE: &str = "application";

pub const CONFIG_FILE_ENV_VAR: &str = "CONFIG_FILE";

/// Environment variable whose value is upper-cased before it overrides
/// `storage.type`, so `STORAGE_TYPE=elasticsearch` selects `ELASTICSEARCH`.
const STORAGE_TYPE_ENV_VAR: &str = "STORAGE_TYPE";

/// Environment variables that override single configuration paths.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("KAFKA_BOOTSTRAP_SERVERS", "kafka-streams.bootstrap-servers"),
    ("KAFKA_STREAMS_APPLICATION_ID", "kafka-streams.application-id"),
    ("KAFKA_TOPIC_SPANS", "kafka-streams.topics.spans"),
    ("FORMAT", "format"),
    (STORAGE_TYPE_ENV_VAR, "storage.type"),
    ("ES_INDEX", "storage.elasticsearch.index"),
    ("ES_HOSTS", "storage.elasticsearch.urls"),
    ("ES_DATE_SEPARATOR", "storage.elasticsearch.date-separator"),
    ("CASSANDRA_KEYSPACE", "storage.cassandra.keyspace"),
    ("CASSANDRA_CONTACT_POINTS", "storage.cassandra.contact-points"),
];

/// Read access to a hierarchical configuration tree addressed by dotted paths.
pub trait ConfigSource {
    /// Returns the value at `path`, failing with [`ConfigError::MissingKey`] when
    /// the path is absent.
    fn get_string(&self, path: &str) -> Result<String, ConfigError>;

    fn get_enum<E: ConfigEnum>(&self, path: &str) -> Result<E, ConfigError> {
        let value = self.get_string(path)?;
        E::from_token(&value).ok_or_else(|| ConfigError::InvalidEnumValue {
            path: path.to_owned(),
            value,
            expected: E::TOKENS.join(", "),
        })
    }
}

/// An enum that can be read from a configuration token.
pub trait ConfigEnum: Sized {
    const TOKENS: &'static [&'static str];

    fn from_token(token: &str) -> Option<Self>;
}

impl ConfigSource for config::Config {
    fn get_string(&self, path: &str) -> Result<String, ConfigError> {
        config::Config::get_string(self, path).map_err(|e| match e {
            config::ConfigError::NotFound(_) => ConfigError::MissingKey {
                path: path.to_owned(),
            },
            other => ConfigError::InvalidValue {
                path: path.to_owned(),
                reason: other.to_string(),
            },
        })
    }
}

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to apply override from environment variable `{variable}`")]
    Override {
        variable: &'static str,
        #[source]
        source: config::ConfigError,
    },

    #[error("failed to read configuration file `{file}`")]
    File {
        file: String,
        #[source]
        source: config::ConfigError,
    },
}

/// Layers the optional configuration `file` under the environment overrides
/// returned by `env`.
pub fn load<F>(file: &str, env: F) -> Result<config::Config, LoadConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = config::Config::builder()
        .add_source(config::File::with_name(file).required(false));

    for (variable, path) in ENV_OVERRIDES {
        let mut value = env(variable);
        if *variable == STORAGE_TYPE_ENV_VAR {
            value = value.map(|v| v.to_ascii_uppercase());
        }
        builder = builder
            .set_override_option(*path, value)
            .map_err(|source| LoadConfigError::Override { variable, source })?;
    }

    builder.build().map_err(|source| LoadConfigError::File {
        file: file.to_owned(),
        source,
    })
}

/// [`load`] against the process environment.
pub fn load_from_env() -> Result<config::Config, LoadConfigError> {
    let file =
        std::env::var(CONFIG_FILE_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_owned());
    load(&file, |name| std::env::var(name).ok())
}
