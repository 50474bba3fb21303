use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rtspmap_types::{CatalogError, DEFAULT_WORKERS, PathCatalog, PortCatalog, ScanConfig};

use crate::playback::Player;
use crate::snapshot::SnapshotConfig;

/// rtspmap: find RTSP camera streams on an IPv4 network
#[derive(Parser, Debug)]
#[command(
    name = "rtspmap",
    version,
    about = "RTSP stream discovery, snapshot and playback launcher"
)]
pub struct Args {
    /// Network to scan in CIDR notation (e.g., 192.168.1.0/24). Prompted for when omitted.
    #[arg(value_name = "CIDR")]
    pub cidr: Option<String>,

    /// Candidate RTSP ports, probed in order (e.g., 554,8554)
    #[arg(short = 'p', long = "ports", value_name = "PORTS")]
    pub ports: Option<String>,

    /// Stream paths tried with DESCRIBE, in order (e.g., /live,/h264)
    #[arg(long = "paths", value_name = "PATHS")]
    pub paths: Option<String>,

    /// Number of hosts scanned concurrently
    #[arg(short = 'w', long = "workers", value_name = "N", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// TCP connect timeout in milliseconds
    #[arg(long = "connect-timeout", value_name = "MS", default_value = "2000")]
    pub connect_timeout_ms: u64,

    /// Reply read timeout in milliseconds
    #[arg(long = "read-timeout", value_name = "MS", default_value = "2000")]
    pub read_timeout_ms: u64,

    /// Directory snapshots are saved to
    #[arg(long = "snapshot-dir", value_name = "DIR", default_value = ".")]
    pub snapshot_dir: PathBuf,

    /// Skip the HTTP snapshot attempt
    #[arg(long = "no-snapshot")]
    pub no_snapshot: bool,

    /// Do not launch a player for the selected stream
    #[arg(long = "no-play")]
    pub no_play: bool,

    /// Player command run as `<CMD> <URL>` (default: VLC for Android intent)
    #[arg(long = "player", value_name = "CMD")]
    pub player: Option<String>,

    /// Print the scan report as JSON and exit
    #[arg(long = "json")]
    pub json: bool,

    /// Increase verbosity level (use -v, -vv or -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Scan tunables with any catalog and timing overrides applied.
    pub fn scan_config(&self) -> Result<ScanConfig, CatalogError> {
        let mut config = ScanConfig {
            workers: self.workers,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            ..ScanConfig::default()
        };
        if let Some(ref ports) = self.ports {
            config.ports = PortCatalog::parse(ports)?;
        }
        if let Some(ref paths) = self.paths {
            config.paths = PathCatalog::parse(paths)?;
        }
        Ok(config)
    }

    pub fn snapshot_config(&self) -> SnapshotConfig {
        SnapshotConfig {
            output_dir: self.snapshot_dir.clone(),
            ..SnapshotConfig::default()
        }
    }

    pub fn player(&self) -> Player {
        Player::from_arg(self.player.as_deref())
    }
}
