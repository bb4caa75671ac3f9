use crate::error::ConfigError;
use crate::hosts::{self, HostDescriptor};
use crate::source::{ConfigEnum, ConfigSource};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

const STORAGE_PATH: &str = "storage";
const TYPE_PATH: &str = "storage.type";
const ES_INDEX_PATH: &str = "storage.elasticsearch.index";
const ES_URLS_PATH: &str = "storage.elasticsearch.urls";
const ES_DATE_SEPARATOR_PATH: &str = "storage.elasticsearch.date-separator";
const CASSANDRA_KEYSPACE_PATH: &str = "storage.cassandra.keyspace";
const CASSANDRA_CONTACT_POINTS_PATH: &str = "storage.cassandra.contact-points";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageType {
    Elasticsearch,
    Cassandra,
    Stdout,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Elasticsearch => "ELASTICSEARCH",
            StorageType::Cassandra => "CASSANDRA",
            StorageType::Stdout => "STDOUT",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigEnum for StorageType {
    const TOKENS: &'static [&'static str] = &["ELASTICSEARCH", "CASSANDRA", "STDOUT"];

    fn from_token(token: &str) -> Option<Self> {
        [
            StorageType::Elasticsearch,
            StorageType::Cassandra,
            StorageType::Stdout,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == token)
    }
}

/// Where dependency links are written. Only the payload of the selected backend
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum StorageConfig {
    Elasticsearch(ElasticsearchStorageConfig),
    Cassandra(CassandraStorageConfig),
    Stdout,
}

impl StorageConfig {
    /// Folds a discriminator and the optional per-backend payloads into a
    /// `StorageConfig`. The payload matching `storage_type` must be present and the
    /// other one absent.
    pub fn from_parts(
        storage_type: StorageType,
        elasticsearch: Option<ElasticsearchStorageConfig>,
        cassandra: Option<CassandraStorageConfig>,
    ) -> Result<Self, ConfigError> {
        let violation = |reason: &str| ConfigError::InvariantViolation {
            path: STORAGE_PATH.to_owned(),
            reason: format!("storage type {storage_type} {reason}"),
        };

        match (storage_type, elasticsearch, cassandra) {
            (StorageType::Elasticsearch, Some(es), None) => Ok(StorageConfig::Elasticsearch(es)),
            (StorageType::Cassandra, None, Some(cassandra)) => {
                Ok(StorageConfig::Cassandra(cassandra))
            }
            (StorageType::Stdout, None, None) => Ok(StorageConfig::Stdout),
            (StorageType::Stdout, _, _) => Err(violation("takes no backend settings")),
            (StorageType::Elasticsearch, None, _) => {
                Err(violation("requires elasticsearch settings"))
            }
            (StorageType::Cassandra, _, None) => Err(violation("requires cassandra settings")),
            (_, Some(_), Some(_)) => Err(violation(
                "cannot carry both elasticsearch and cassandra settings",
            )),
        }
    }

    /// Reads the discriminator, then only the keys of the selected backend.
    pub(crate) fn read(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        let storage_type = source.get_enum::<StorageType>(TYPE_PATH)?;

        let (elasticsearch, cassandra) = match storage_type {
            StorageType::Elasticsearch => (Some(ElasticsearchStorageConfig::read(source)?), None),
            StorageType::Cassandra => (None, Some(CassandraStorageConfig::read(source)?)),
            StorageType::Stdout => (None, None),
        };

        Self::from_parts(storage_type, elasticsearch, cassandra)
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            StorageConfig::Elasticsearch(_) => StorageType::Elasticsearch,
            StorageConfig::Cassandra(_) => StorageType::Cassandra,
            StorageConfig::Stdout => StorageType::Stdout,
        }
    }

    pub fn elasticsearch(&self) -> Option<&ElasticsearchStorageConfig> {
        match self {
            StorageConfig::Elasticsearch(es) => Some(es),
            _ => None,
        }
    }

    pub fn cassandra(&self) -> Option<&CassandraStorageConfig> {
        match self {
            StorageConfig::Cassandra(cassandra) => Some(cassandra),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElasticsearchStorageConfig {
    index: String,
    urls: String,
    date_separator: String,
    nodes: Vec<HostDescriptor>,
}

impl ElasticsearchStorageConfig {
    /// Validates `urls` up front; the parsed hosts are served by [`Self::nodes`].
    pub fn new(
        index: impl Into<String>,
        urls: impl Into<String>,
        date_separator: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let index = index.into();
        if index.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                path: ES_INDEX_PATH.to_owned(),
            });
        }
        let urls = urls.into();
        let nodes = hosts::parse(&urls).map_err(|e| ConfigError::list(ES_URLS_PATH, e))?;

        Ok(Self {
            index,
            urls,
            date_separator: date_separator.into(),
            nodes,
        })
    }

    fn read(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        Self::new(
            source.get_string(ES_INDEX_PATH)?,
            source.get_string(ES_URLS_PATH)?,
            source.get_string(ES_DATE_SEPARATOR_PATH)?,
        )
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn urls(&self) -> &str {
        &self.urls
    }

    pub fn date_separator(&self) -> &str {
        &self.date_separator
    }

    /// Endpoints in the order they were configured.
    pub fn nodes(&self) -> &[HostDescriptor] {
        &self.nodes
    }

    /// Daily index holding the dependency links of `date`, e.g.
    /// `zipkin:dependency-2024-03-07`.
    pub fn dependency_index(&self, date: NaiveDate) -> String {
        let sep = &self.date_separator;
        format!(
            "{}:dependency-{:04}{sep}{:02}{sep}{:02}",
            self.index,
            date.year(),
            date.month(),
            date.day()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CassandraStorageConfig {
    keyspace: String,
    contact_points: Vec<String>,
}

impl CassandraStorageConfig {
    pub fn new(keyspace: impl Into<String>, contact_points: &str) -> Result<Self, ConfigError> {
        let keyspace = keyspace.into();
        if keyspace.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                path: CASSANDRA_KEYSPACE_PATH.to_owned(),
            });
        }
        let contact_points = hosts::split(contact_points)
            .map_err(|e| ConfigError::list(CASSANDRA_CONTACT_POINTS_PATH, e))?
            .into_iter()
            .map(str::to_owned)
            .collect();

        Ok(Self {
            keyspace,
            contact_points,
        })
    }

    fn read(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        Self::new(
            source.get_string(CASSANDRA_KEYSPACE_PATH)?,
            &source.get_string(CASSANDRA_CONTACT_POINTS_PATH)?,
        )
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn contact_points(&self) -> &[String] {
        &self.contact_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosts::HostListError;

    fn es() -> ElasticsearchStorageConfig {
        ElasticsearchStorageConfig::new("zipkin", "http://es1:9200", "-").unwrap()
    }

    fn cassandra() -> CassandraStorageConfig {
        CassandraStorageConfig::new("zipkin", "10.0.0.1").unwrap()
    }

    #[test]
    fn storage_type_tokens_match_exactly() {
        assert_eq!(
            StorageType::from_token("ELASTICSEARCH"),
            Some(StorageType::Elasticsearch)
        );
        assert_eq!(
            StorageType::from_token("CASSANDRA"),
            Some(StorageType::Cassandra)
        );
        assert_eq!(StorageType::from_token("STDOUT"), Some(StorageType::Stdout));

        assert_eq!(StorageType::from_token("cassandra"), None);
        assert_eq!(StorageType::from_token("Stdout"), None);
        assert_eq!(StorageType::from_token(" STDOUT "), None);
        assert_eq!(StorageType::from_token("REDIS"), None);
    }

    #[test]
    fn from_parts_accepts_matching_payloads() {
        let storage =
            StorageConfig::from_parts(StorageType::Elasticsearch, Some(es()), None).unwrap();
        assert_eq!(storage.storage_type(), StorageType::Elasticsearch);
        assert!(storage.elasticsearch().is_some());
        assert!(storage.cassandra().is_none());

        let storage =
            StorageConfig::from_parts(StorageType::Cassandra, None, Some(cassandra())).unwrap();
        assert_eq!(storage.storage_type(), StorageType::Cassandra);
        assert!(storage.elasticsearch().is_none());
        assert!(storage.cassandra().is_some());

        let storage = StorageConfig::from_parts(StorageType::Stdout, None, None).unwrap();
        assert_eq!(storage, StorageConfig::Stdout);
        assert!(storage.elasticsearch().is_none());
        assert!(storage.cassandra().is_none());
    }

    #[test]
    fn from_parts_rejects_mismatched_payloads() {
        let cases = [
            StorageConfig::from_parts(StorageType::Elasticsearch, None, None),
            StorageConfig::from_parts(StorageType::Elasticsearch, None, Some(cassandra())),
            StorageConfig::from_parts(StorageType::Cassandra, Some(es()), None),
            StorageConfig::from_parts(StorageType::Cassandra, Some(es()), Some(cassandra())),
            StorageConfig::from_parts(StorageType::Stdout, Some(es()), None),
            StorageConfig::from_parts(StorageType::Stdout, None, Some(cassandra())),
        ];

        for result in cases {
            assert!(matches!(
                result,
                Err(ConfigError::InvariantViolation { ref path, .. }) if path == "storage"
            ));
        }
    }

    #[test]
    fn contact_points_are_split_in_order() {
        let cassandra = CassandraStorageConfig::new("zipkin", "10.0.0.1,10.0.0.2").unwrap();
        assert_eq!(cassandra.contact_points(), ["10.0.0.1", "10.0.0.2"]);

        let cassandra = CassandraStorageConfig::new("zipkin", " 10.0.0.1 , 10.0.0.2 ").unwrap();
        assert_eq!(cassandra.contact_points(), ["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn contact_points_reject_trailing_comma() {
        let err = CassandraStorageConfig::new("zipkin", "10.0.0.1,").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EmptyOrMalformedList {
                ref path,
                source: HostListError::EmptyEntry { position: 1, .. },
            } if path == "storage.cassandra.contact-points"
        ));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            CassandraStorageConfig::new(" ", "10.0.0.1"),
            Err(ConfigError::EmptyValue { ref path }) if path == "storage.cassandra.keyspace"
        ));
        assert!(matches!(
            ElasticsearchStorageConfig::new("", "http://es1:9200", "-"),
            Err(ConfigError::EmptyValue { ref path }) if path == "storage.elasticsearch.index"
        ));
    }

    #[test]
    fn elasticsearch_nodes_keep_input_order() {
        let es = ElasticsearchStorageConfig::new("zipkin", "http://es2:9200,http://es1:9200", "-")
            .unwrap();
        let hosts: Vec<_> = es.nodes().iter().map(|n| n.host.as_str()).collect();
        assert_eq!(hosts, vec!["es2", "es1"]);
        assert_eq!(es.urls(), "http://es2:9200,http://es1:9200");
    }

    #[test]
    fn elasticsearch_rejects_malformed_urls() {
        let err = ElasticsearchStorageConfig::new("zipkin", "http://es1:9200,", "-").unwrap_err();
        assert_eq!(err.path(), "storage.elasticsearch.urls");
    }

    #[test]
    fn dependency_index_uses_date_separator() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(es().dependency_index(date), "zipkin:dependency-2024-03-07");

        let dotted = ElasticsearchStorageConfig::new("traces", "es1", ".").unwrap();
        assert_eq!(dotted.dependency_index(date), "traces:dependency-2024.03.07");

        let compact = ElasticsearchStorageConfig::new("zipkin", "es1", "").unwrap();
        assert_eq!(compact.dependency_index(date), "zipkin:dependency-20240307");
    }
}
