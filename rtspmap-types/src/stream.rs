use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// A confirmed stream endpoint: the host answered OPTIONS on `port` and
/// DESCRIBE on `path`.
///
/// Fields are read-only once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamHit {
    address: Ipv4Addr,
    port: u16,
    path: String,
}

impl StreamHit {
    pub fn new(address: Ipv4Addr, port: u16, path: impl Into<String>) -> Self {
        Self {
            address,
            port,
            path: path.into(),
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `rtsp://host:port/path` without credentials.
    pub fn url(&self) -> String {
        format!("rtsp://{}:{}{}", self.address, self.port, self.path)
    }
}

impl fmt::Display for StreamHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.address, self.port, self.path)
    }
}
