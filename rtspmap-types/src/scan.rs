use crate::catalog::{PathCatalog, PortCatalog};
use crate::stream::StreamHit;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of hosts scanned concurrently.
pub const DEFAULT_WORKERS: usize = 40;

/// Default bound for both the connect and the single read of a probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Bytes read from a probe reply. One read only; short reads are accepted.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Tunables for one scan. Built once at startup.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub ports: PortCatalog,
    pub paths: PathCatalog,
    /// Size of the worker pool (hosts in flight at once).
    pub workers: usize,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub read_buffer_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ports: PortCatalog::default(),
            paths: PathCatalog::rtsp_default(),
            workers: DEFAULT_WORKERS,
            connect_timeout: DEFAULT_PROBE_TIMEOUT,
            read_timeout: DEFAULT_PROBE_TIMEOUT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

/// Frozen outcome of a completed scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Normalized network that was scanned, e.g. `192.168.1.0/24`.
    pub network: String,
    /// Hits in completion order across hosts, catalog order within a host.
    pub hits: Vec<StreamHit>,
    pub hosts_scanned: usize,
    /// Hosts that answered OPTIONS on some candidate port.
    pub hosts_live: usize,
    pub total_duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_config_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.workers, 40);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.read_timeout, Duration::from_secs(2));
        assert_eq!(config.read_buffer_size, 1024);
        assert_eq!(config.ports.as_slice(), &[554, 8554, 10554]);
        assert_eq!(config.paths.len(), 9);
    }
}
