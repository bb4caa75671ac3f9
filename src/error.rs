use crate::hosts::HostListError;
use thiserror::Error;

/// Failure to assemble an [`AppConfig`](crate::config::AppConfig). Every variant
/// names the configuration path it is about.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration key `{path}`")]
    MissingKey { path: String },

    #[error("configuration key `{path}` must not be empty")]
    EmptyValue { path: String },

    #[error("configuration key `{path}` could not be read: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("`{value}` is not a valid value for `{path}`; expected one of {expected}")]
    InvalidEnumValue {
        path: String,
        value: String,
        expected: String,
    },

    #[error("invalid list in `{path}`: {source}")]
    EmptyOrMalformedList {
        path: String,
        #[source]
        source: HostListError,
    },

    #[error("inconsistent configuration at `{path}`: {reason}")]
    InvariantViolation { path: String, reason: String },
}

impl ConfigError {
    pub fn path(&self) -> &str {
        match self {
            ConfigError::MissingKey { path }
            | ConfigError::EmptyValue { path }
            | ConfigError::InvalidValue { path, .. }
            | ConfigError::InvalidEnumValue { path, .. }
            | ConfigError::EmptyOrMalformedList { path, .. }
            | ConfigError::InvariantViolation { path, .. } => path,
        }
    }

    pub(crate) fn list(path: &str, source: HostListError) -> Self {
        ConfigError::EmptyOrMalformedList {
            path: path.to_owned(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let err = ConfigError::MissingKey {
            path: "storage.type".into(),
        };
        assert_eq!(err.path(), "storage.type");
        assert!(err.to_string().contains("`storage.type`"));

        let err = ConfigError::list("storage.elasticsearch.urls", HostListError::Empty);
        assert_eq!(err.path(), "storage.elasticsearch.urls");
        assert!(err.to_string().contains("host list is empty"));
    }
}
