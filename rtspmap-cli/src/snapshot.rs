//! Best-effort still image capture over the camera's HTTP interface.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rtspmap_types::PathCatalog;
use thiserror::Error;
use tracing::{debug, info};

use crate::prompt::Credentials;

pub const DEFAULT_SNAPSHOT_PORT: u16 = 80;
pub const DEFAULT_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(3);
/// Bodies at or below this size are error pages, not images.
pub const MIN_SNAPSHOT_BYTES: usize = 5000;

#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub port: u16,
    pub timeout: Duration,
    pub min_bytes: usize,
    pub paths: PathCatalog,
    pub output_dir: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SNAPSHOT_PORT,
            timeout: DEFAULT_SNAPSHOT_TIMEOUT,
            min_bytes: MIN_SNAPSHOT_BYTES,
            paths: PathCatalog::snapshot_default(),
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("no snapshot available from {0}")]
    Unavailable(Ipv4Addr),
    #[error("failed to write snapshot {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tries each snapshot path in catalog order and saves the first real image.
pub struct SnapshotCapture {
    client: reqwest::Client,
    config: SnapshotConfig,
}

impl SnapshotCapture {
    pub fn new(config: SnapshotConfig) -> Result<Self, SnapshotError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .no_proxy()
            .build()?;
        Ok(Self { client, config })
    }

    pub fn snapshot_url(&self, host: Ipv4Addr, path: &str) -> String {
        if self.config.port == DEFAULT_SNAPSHOT_PORT {
            format!("http://{host}{path}")
        } else {
            format!("http://{host}:{}{path}", self.config.port)
        }
    }

    /// Save the first body larger than the configured minimum and return its
    /// path. Every per-path failure is skipped silently.
    pub async fn capture(
        &self,
        host: Ipv4Addr,
        credentials: Option<&Credentials>,
    ) -> Result<PathBuf, SnapshotError> {
        for path in self.config.paths.iter() {
            let url = self.snapshot_url(host, path);
            let Some(body) = self.fetch(&url, credentials).await else {
                continue;
            };
            if body.len() <= self.config.min_bytes {
                debug!(%url, bytes = body.len(), "snapshot body too small");
                continue;
            }

            let file = self
                .config
                .output_dir
                .join(snapshot_filename(host, SystemTime::now()));
            tokio::fs::write(&file, &body)
                .await
                .map_err(|source| SnapshotError::Write {
                    path: file.clone(),
                    source,
                })?;
            info!(%url, bytes = body.len(), file = %file.display(), "snapshot saved");
            return Ok(file);
        }

        Err(SnapshotError::Unavailable(host))
    }

    async fn fetch(&self, url: &str, credentials: Option<&Credentials>) -> Option<Vec<u8>> {
        let mut request = self.client.get(url);
        if let Some(creds) = credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "snapshot request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(%url, status = %response.status(), "snapshot rejected");
            return None;
        }

        match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                debug!(%url, error = %e, "snapshot body read failed");
                None
            }
        }
    }
}

/// `snapshot_<host>_<HHMMSS>.jpg`, time of day in UTC.
pub fn snapshot_filename(host: Ipv4Addr, now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let day = secs % 86_400;
    format!(
        "snapshot_{host}_{:02}{:02}{:02}.jpg",
        day / 3600,
        (day % 3600) / 60,
        day % 60
    )
}
