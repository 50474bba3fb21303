use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Well-known RTSP listener ports, probed in this order.
pub const DEFAULT_RTSP_PORTS: &[u16] = &[554, 8554, 10554];

/// Vendor stream paths tried with DESCRIBE once a port answers OPTIONS.
pub const DEFAULT_RTSP_PATHS: &[&str] = &[
    "/",
    "/live",
    "/h264",
    "/mpeg4",
    "/Streaming/Channels/101",
    "/cam/realmonitor?channel=1&subtype=0",
    "/user=admin&password=&channel=1&stream=0.sdp",
    "/profile1",
    "/videoMain",
];

/// Vendor HTTP snapshot endpoints, tried in this order.
pub const DEFAULT_SNAPSHOT_PATHS: &[&str] = &[
    "/cgi-bin/snapshot.cgi",
    "/ISAPI/Streaming/channels/101/picture",
    "/onvif-http/snapshot",
    "/snapshot.jpg",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog is empty")]
    Empty,
    #[error("invalid port: {0} (ports must be 1-65535)")]
    InvalidPort(String),
    #[error("invalid path: '{0}' (paths must start with '/')")]
    InvalidPath(String),
    #[error("duplicate catalog entry: {0}")]
    Duplicate(String),
}

/// Ordered, immutable list of candidate RTSP ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortCatalog {
    ports: Vec<u16>,
}

impl PortCatalog {
    pub fn new(ports: Vec<u16>) -> Result<Self, CatalogError> {
        if ports.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for &port in &ports {
            if port == 0 {
                return Err(CatalogError::InvalidPort(port.to_string()));
            }
            if !seen.insert(port) {
                return Err(CatalogError::Duplicate(port.to_string()));
            }
        }
        Ok(Self { ports })
    }

    /// Parse a comma-separated port list like "554,8554".
    pub fn parse(input: &str) -> Result<Self, CatalogError> {
        let ports = input
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u16>()
                    .map_err(|_| CatalogError::InvalidPort(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(ports)
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.ports
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl Default for PortCatalog {
    fn default() -> Self {
        Self {
            ports: DEFAULT_RTSP_PORTS.to_vec(),
        }
    }
}

/// Ordered, immutable list of URL path templates.
///
/// Used both for RTSP stream paths and HTTP snapshot paths. Order is the
/// probe order and is preserved in every result derived from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCatalog {
    paths: Vec<String>,
}

impl PathCatalog {
    pub fn new<I, S>(paths: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        if paths.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for path in &paths {
            if !path.starts_with('/') {
                return Err(CatalogError::InvalidPath(path.clone()));
            }
            if !seen.insert(path.as_str()) {
                return Err(CatalogError::Duplicate(path.clone()));
            }
        }
        Ok(Self { paths })
    }

    /// Parse a comma-separated path list like "/live,/h264".
    pub fn parse(input: &str) -> Result<Self, CatalogError> {
        Self::new(
            input
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty()),
        )
    }

    /// The built-in RTSP stream path catalog.
    pub fn rtsp_default() -> Self {
        Self::from_static(DEFAULT_RTSP_PATHS)
    }

    /// The built-in HTTP snapshot path catalog.
    pub fn snapshot_default() -> Self {
        Self::from_static(DEFAULT_SNAPSHOT_PATHS)
    }

    fn from_static(paths: &[&str]) -> Self {
        Self {
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for PathCatalog {
    fn default() -> Self {
        Self::rtsp_default()
    }
}
