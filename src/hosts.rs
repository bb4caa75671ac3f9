use serde::Serialize;
use std::fmt;
use thiserror::Error;
use url::{Host, Url};

const LIST_SEPARATOR: char = ',';

/// Scheme used to validate bare `host[:port]` entries. Not a special scheme in the
/// URL standard, so `Url::port` keeps whatever port was written.
const BARE_SCHEME: &str = "tcp";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostListError {
    #[error("host list is empty")]
    Empty,
    #[error("entry {position} of `{raw}` is empty")]
    EmptyEntry { raw: String, position: usize },
    #[error("`{entry}` is not a valid host: {reason}")]
    Malformed { entry: String, reason: String },
}

/// One endpoint out of a comma-separated host list. IPv6 hosts are stored without
/// brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostDescriptor {
    pub scheme: Option<String>,
    pub host: String,
    pub port: Option<u16>,
}

impl fmt::Display for HostDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{scheme}://")?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            f.write_str(&self.host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

/// Splits `raw` on commas and trims every piece. Empty pieces are rejected rather
/// than dropped, so `"a,"` is an error.
pub fn split(raw: &str) -> Result<Vec<&str>, HostListError> {
    if raw.trim().is_empty() {
        return Err(HostListError::Empty);
    }

    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .enumerate()
        .map(|(position, piece)| {
            if piece.is_empty() {
                Err(HostListError::EmptyEntry {
                    raw: raw.to_owned(),
                    position,
                })
            } else {
                Ok(piece)
            }
        })
        .collect()
}

/// Parses a comma-separated list of `scheme://host[:port]` or `host[:port]` entries.
/// Order and duplicates are kept as written.
pub fn parse(raw: &str) -> Result<Vec<HostDescriptor>, HostListError> {
    split(raw)?.into_iter().map(parse_entry).collect()
}

fn parse_entry(entry: &str) -> Result<HostDescriptor, HostListError> {
    let malformed = |reason: String| HostListError::Malformed {
        entry: entry.to_owned(),
        reason,
    };

    let (scheme, url) = if entry.contains("://") {
        let url = Url::parse(entry).map_err(|e| malformed(e.to_string()))?;
        (Some(url.scheme().to_owned()), url)
    } else {
        let url = Url::parse(&format!("{BARE_SCHEME}://{entry}"))
            .map_err(|e| malformed(e.to_string()))?;
        (None, url)
    };

    if !matches!(url.path(), "" | "/") || url.query().is_some() || url.fragment().is_some() {
        return Err(malformed("paths, queries and fragments are not allowed".into()));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(malformed("credentials are not allowed".into()));
    }

    let host = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_owned(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(malformed("missing host".into())),
    };

    // `Url::port` hides a default port even when it was written out.
    let port = if scheme.is_some() && has_explicit_port(entry) {
        url.port_or_known_default()
    } else {
        url.port()
    };

    Ok(HostDescriptor { scheme, host, port })
}

/// Whether the authority of a `scheme://authority/...` entry ends in `:port`.
fn has_explicit_port(entry: &str) -> bool {
    let authority = entry
        .split_once("://")
        .map_or(entry, |(_, rest)| rest)
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let after_host = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };

    after_host
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty())
}
