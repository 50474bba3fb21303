use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rtspmap_scan::{LIVENESS_PATH, PathDiscoverer, Prober, TcpRtspProber};
use rtspmap_types::{PortCatalog, RtspMethod, ScanConfig, ScanReport, StreamHit};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::results::ResultSet;
use crate::target::{TargetParseError, parse_network, usable_hosts};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidNetwork(#[from] TargetParseError),
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("scan cancelled")]
    Cancelled,
}

/// Event emitted during a streaming scan.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Targets expanded, workers about to start.
    Started {
        network: String,
        hosts_total: usize,
        workers: usize,
    },
    /// One address fully processed. `hits` is empty for dead hosts and for
    /// live hosts where no catalog path answered.
    HostComplete {
        address: Ipv4Addr,
        live_port: Option<u16>,
        hits: Vec<StreamHit>,
        hosts_completed: usize,
        hosts_total: usize,
    },
    /// Entire scan completed. Always the last event on success.
    Complete(Box<ScanReport>),
}

/// What one worker learned about one address.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HostScan {
    address: Ipv4Addr,
    live_port: Option<u16>,
    paths: Vec<String>,
}

impl HostScan {
    fn hits(&self) -> Vec<StreamHit> {
        match self.live_port {
            Some(port) => self
                .paths
                .iter()
                .map(|path| StreamHit::new(self.address, port, path.as_str()))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// State shared by the worker pool for the lifetime of one scan.
struct WorkerContext {
    addresses: Vec<Ipv4Addr>,
    /// Index of the next address to hand out.
    cursor: AtomicUsize,
    completed: AtomicUsize,
    live: AtomicUsize,
    ports: PortCatalog,
    discoverer: PathDiscoverer,
    results: ResultSet,
    tx: mpsc::Sender<ScanEvent>,
    cancel: CancellationToken,
}

pub struct ScanEngine;

impl ScanEngine {
    /// Scan `cidr` with the TCP prober and return the frozen results.
    pub async fn run(config: &ScanConfig, cidr: &str) -> Result<ScanReport, EngineError> {
        let cancel = CancellationToken::new();
        let prober = TcpRtspProber::from_config(config).with_cancellation(cancel.clone());
        Self::run_with(config, cidr, Arc::new(prober), cancel).await
    }

    /// Like [`run`](Self::run), with a caller-supplied prober and token.
    ///
    /// Either every address is processed and the full report is returned, or
    /// the token fires and [`EngineError::Cancelled`] is returned. Partial
    /// results are never handed back.
    pub async fn run_with(
        config: &ScanConfig,
        cidr: &str,
        prober: Arc<dyn Prober>,
        cancel: CancellationToken,
    ) -> Result<ScanReport, EngineError> {
        // Nobody listens; sends fail immediately and are ignored.
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        Self::run_streaming(config, cidr, prober, tx, cancel).await
    }

    /// Execute a scan, emitting [`ScanEvent`]s as hosts complete.
    ///
    /// Events are sent best-effort: a dropped receiver does not stop the
    /// scan. The network is validated before any probe is sent.
    pub async fn run_streaming(
        config: &ScanConfig,
        cidr: &str,
        prober: Arc<dyn Prober>,
        tx: mpsc::Sender<ScanEvent>,
        cancel: CancellationToken,
    ) -> Result<ScanReport, EngineError> {
        let network = parse_network(cidr)?;
        if config.workers == 0 {
            return Err(EngineError::NoWorkers);
        }

        let start = Instant::now();
        let addresses = usable_hosts(network);
        let hosts_total = addresses.len();
        let workers = config.workers.min(hosts_total).max(1);

        info!(
            network = %network,
            hosts = hosts_total,
            workers,
            ports = ?config.ports.as_slice(),
            paths = config.paths.len(),
            "starting RTSP sweep"
        );
        let _ = tx
            .send(ScanEvent::Started {
                network: network.to_string(),
                hosts_total,
                workers,
            })
            .await;

        let results = ResultSet::new();
        let ctx = Arc::new(WorkerContext {
            addresses,
            cursor: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            live: AtomicUsize::new(0),
            ports: config.ports.clone(),
            discoverer: PathDiscoverer::new(prober, config.paths.clone()),
            results: results.clone(),
            tx: tx.clone(),
            cancel: cancel.clone(),
        });

        let mut join_set = JoinSet::new();
        for _ in 0..workers {
            join_set.spawn(run_worker(ctx.clone()));
        }

        // Barrier: every worker exits once the address list is drained or the
        // token fires.
        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                warn!("scan worker failed: {}", e);
            }
        }

        if cancel.is_cancelled() {
            info!(
                completed = ctx.completed.load(Ordering::Relaxed),
                hosts = hosts_total,
                "scan cancelled"
            );
            return Err(EngineError::Cancelled);
        }

        let hosts_live = ctx.live.load(Ordering::Relaxed);
        drop(ctx);

        let report = ScanReport {
            network: network.to_string(),
            hits: results.freeze(),
            hosts_scanned: hosts_total,
            hosts_live,
            total_duration: start.elapsed(),
        };
        info!(
            hits = report.hits.len(),
            hosts_live,
            elapsed_ms = report.total_duration.as_millis() as u64,
            "scan complete"
        );
        let _ = tx.send(ScanEvent::Complete(Box::new(report.clone()))).await;

        Ok(report)
    }
}

/// Pull addresses off the shared list until it is empty or the scan is
/// cancelled.
async fn run_worker(ctx: Arc<WorkerContext>) {
    let hosts_total = ctx.addresses.len();

    loop {
        let index = ctx.cursor.fetch_add(1, Ordering::Relaxed);
        let Some(&address) = ctx.addresses.get(index) else {
            break;
        };

        let scan = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            scan = scan_host(address, &ctx.ports, &ctx.discoverer) => scan,
        };
        // A path loop that saw cancelled probes is incomplete; drop it.
        if ctx.cancel.is_cancelled() {
            break;
        }

        let hits = scan.hits();
        if scan.live_port.is_some() {
            ctx.live.fetch_add(1, Ordering::Relaxed);
        }
        if !hits.is_empty() {
            ctx.results.extend(hits.iter().cloned());
        }

        let hosts_completed = ctx.completed.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = ctx
            .tx
            .send(ScanEvent::HostComplete {
                address,
                live_port: scan.live_port,
                hits,
                hosts_completed,
                hosts_total,
            })
            .await;
    }
}

/// Liveness across the port list, then path discovery on the first live port.
async fn scan_host(address: Ipv4Addr, ports: &PortCatalog, discoverer: &PathDiscoverer) -> HostScan {
    for port in ports.iter() {
        let outcome = discoverer
            .prober()
            .probe(address, port, LIVENESS_PATH, RtspMethod::Options)
            .await;
        if !outcome.is_valid() {
            continue;
        }

        info!(%address, port, "RTSP service answered OPTIONS");
        let paths = discoverer.discover_paths(address, port).await;
        return HostScan {
            address,
            live_port: Some(port),
            paths,
        };
    }

    debug!(%address, "no RTSP port answered");
    HostScan {
        address,
        live_port: None,
        paths: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rtspmap_types::{PathCatalog, ProbeFault, ProbeOutcome};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::time::Duration;

    type Call = (Ipv4Addr, u16, String, RtspMethod);

    /// In-memory network: a key present in `services` answers OPTIONS, and
    /// answers DESCRIBE for the listed paths.
    #[derive(Default)]
    struct FakeNetwork {
        services: HashMap<(Ipv4Addr, u16), Vec<&'static str>>,
        delay: Duration,
        calls: Mutex<Vec<Call>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        per_host: Mutex<HashMap<Ipv4Addr, usize>>,
        max_per_host: AtomicUsize,
    }

    impl FakeNetwork {
        fn with(services: &[((u8, u8, u8, u8), u16, &[&'static str])]) -> Self {
            let services = services
                .iter()
                .map(|&((a, b, c, d), port, paths)| {
                    ((Ipv4Addr::new(a, b, c, d), port), paths.to_vec())
                })
                .collect();
            Self {
                services,
                ..Self::default()
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Prober for FakeNetwork {
        async fn probe(
            &self,
            address: Ipv4Addr,
            port: u16,
            path: &str,
            method: RtspMethod,
        ) -> ProbeOutcome {
            self.calls
                .lock()
                .unwrap()
                .push((address, port, path.to_string(), method));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            {
                let mut per_host = self.per_host.lock().unwrap();
                let count = per_host.entry(address).or_insert(0);
                *count += 1;
                self.max_per_host.fetch_max(*count, Ordering::SeqCst);
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            *self.per_host.lock().unwrap().entry(address).or_insert(1) -= 1;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match (self.services.get(&(address, port)), method) {
                (None, _) => ProbeOutcome::Invalid(ProbeFault::ConnectRefused),
                (Some(_), RtspMethod::Options) => ProbeOutcome::Valid,
                (Some(paths), RtspMethod::Describe) if paths.iter().any(|p| *p == path) => {
                    ProbeOutcome::Valid
                }
                (Some(_), RtspMethod::Describe) => {
                    ProbeOutcome::Invalid(ProbeFault::SignatureMissing)
                }
            }
        }
    }

    async fn scan(
        network: &Arc<FakeNetwork>,
        config: &ScanConfig,
        cidr: &str,
    ) -> Result<ScanReport, EngineError> {
        ScanEngine::run_with(config, cidr, network.clone(), CancellationToken::new()).await
    }

    #[tokio::test]
    async fn two_host_network_end_to_end() {
        let network = Arc::new(FakeNetwork::with(&[((10, 0, 0, 1), 554, &["/live"])]));
        let report = scan(&network, &ScanConfig::default(), "10.0.0.0/30")
            .await
            .unwrap();

        assert_eq!(
            report.hits,
            vec![StreamHit::new(Ipv4Addr::new(10, 0, 0, 1), 554, "/live")]
        );
        assert_eq!(report.hosts_scanned, 2);
        assert_eq!(report.hosts_live, 1);
        assert_eq!(report.network, "10.0.0.0/30");
    }

    #[tokio::test]
    async fn dead_host_only_sees_liveness_probes() {
        let network = Arc::new(FakeNetwork::with(&[((10, 0, 0, 1), 554, &["/live"])]));
        scan(&network, &ScanConfig::default(), "10.0.0.0/30")
            .await
            .unwrap();

        let dead: Vec<Call> = network
            .calls()
            .into_iter()
            .filter(|c| c.0 == Ipv4Addr::new(10, 0, 0, 2))
            .collect();
        let ports: Vec<u16> = dead.iter().map(|c| c.1).collect();
        assert_eq!(ports, vec![554, 8554, 10554]);
        assert!(dead.iter().all(|c| c.3 == RtspMethod::Options && c.2 == "/"));
    }

    #[tokio::test]
    async fn first_live_port_wins() {
        let network = Arc::new(FakeNetwork::with(&[
            ((10, 0, 0, 1), 554, &["/live"]),
            ((10, 0, 0, 1), 8554, &["/h264"]),
        ]));
        let report = scan(&network, &ScanConfig::default(), "10.0.0.1/32")
            .await
            .unwrap();

        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].port(), 554);
        assert!(network.calls().iter().all(|c| c.1 == 554));
    }

    #[tokio::test]
    async fn later_port_used_when_earlier_ports_dead() {
        let network = Arc::new(FakeNetwork::with(&[((10, 0, 0, 1), 10554, &["/videoMain"])]));
        let report = scan(&network, &ScanConfig::default(), "10.0.0.1/32")
            .await
            .unwrap();

        assert_eq!(
            report.hits,
            vec![StreamHit::new(Ipv4Addr::new(10, 0, 0, 1), 10554, "/videoMain")]
        );
        // Path discovery never touched ports that failed liveness
        assert!(
            network
                .calls()
                .iter()
                .filter(|c| c.3 == RtspMethod::Describe)
                .all(|c| c.1 == 10554)
        );
    }

    #[tokio::test]
    async fn hits_keep_catalog_order_within_host() {
        let network = Arc::new(FakeNetwork::with(&[(
            (10, 0, 0, 1),
            554,
            &["/profile1", "/live"],
        )]));
        let report = scan(&network, &ScanConfig::default(), "10.0.0.1/32")
            .await
            .unwrap();

        let paths: Vec<&str> = report.hits.iter().map(|h| h.path()).collect();
        assert_eq!(paths, vec!["/live", "/profile1"]);
    }

    #[tokio::test]
    async fn synthetic_network_cardinality() {
        let network = Arc::new(FakeNetwork::with(&[
            ((192, 168, 1, 10), 554, &["/live", "/h264"]),
            ((192, 168, 1, 11), 8554, &["/Streaming/Channels/101"]),
            // Speaks RTSP but no catalog path applies
            ((192, 168, 1, 12), 554, &[]),
            ((192, 168, 1, 200), 554, &["/", "/profile1", "/videoMain"]),
            // Port outside the catalog never passes liveness
            ((192, 168, 1, 201), 7447, &["/live"]),
        ]));
        let report = scan(&network, &ScanConfig::default(), "192.168.1.0/24")
            .await
            .unwrap();

        assert_eq!(report.hosts_scanned, 254);
        assert_eq!(report.hosts_live, 4);
        assert_eq!(report.hits.len(), 6);

        let unique: HashSet<&StreamHit> = report.hits.iter().collect();
        assert_eq!(unique.len(), report.hits.len());
        for hit in &report.hits {
            assert!(network.services.contains_key(&(hit.address(), hit.port())));
            assert_ne!(hit.port(), 7447);
        }
    }

    #[tokio::test]
    async fn invalid_network_fails_before_any_probe() {
        let network = Arc::new(FakeNetwork::default());
        for cidr in ["not-a-network", "10.0.0.0/40"] {
            let result = scan(&network, &ScanConfig::default(), cidr).await;
            assert!(
                matches!(result, Err(EngineError::InvalidNetwork(_))),
                "{cidr}"
            );
        }
        assert!(network.calls().is_empty());
    }

    #[tokio::test]
    async fn zero_workers_rejected() {
        let network = Arc::new(FakeNetwork::default());
        let config = ScanConfig {
            workers: 0,
            ..ScanConfig::default()
        };
        let result = scan(&network, &config, "10.0.0.0/30").await;
        assert!(matches!(result, Err(EngineError::NoWorkers)));
        assert!(network.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn worker_pool_bounds_concurrency() {
        let network = Arc::new(
            FakeNetwork::with(&[
                ((10, 9, 0, 3), 554, &["/live", "/h264", "/mpeg4"]),
                ((10, 9, 0, 7), 554, &["/live"]),
            ])
            .delayed(Duration::from_millis(2)),
        );
        let config = ScanConfig {
            workers: 4,
            ..ScanConfig::default()
        };
        let report = scan(&network, &config, "10.9.0.0/26").await.unwrap();

        assert_eq!(report.hosts_scanned, 62);
        assert_eq!(report.hits.len(), 4);
        assert!(network.max_in_flight.load(Ordering::SeqCst) <= 4);
        assert_eq!(network.max_per_host.load(Ordering::SeqCst), 1);

        // Every address was probed, and only by one worker
        let probed: HashSet<Ipv4Addr> = network.calls().iter().map(|c| c.0).collect();
        assert_eq!(probed.len(), 62);
    }

    #[tokio::test]
    async fn cancellation_returns_no_partial_results() {
        let network = Arc::new(
            FakeNetwork::with(&[((10, 0, 0, 1), 554, &["/live"])])
                .delayed(Duration::from_millis(200)),
        );
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let result = ScanEngine::run_with(
            &ScanConfig::default(),
            "10.0.0.0/24",
            network.clone(),
            cancel,
        )
        .await;

        assert!(matches!(result, Err(EngineError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn streaming_events_in_order() {
        let network = Arc::new(FakeNetwork::with(&[((10, 0, 0, 2), 8554, &["/h264"])]));
        let (tx, mut rx) = mpsc::channel(64);
        let report = ScanEngine::run_streaming(
            &ScanConfig::default(),
            "10.0.0.0/30",
            network.clone(),
            tx,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 4);

        assert!(matches!(
            events[0],
            ScanEvent::Started {
                hosts_total: 2,
                workers: 2,
                ..
            }
        ));

        let mut live_hits = Vec::new();
        for event in &events[1..3] {
            match event {
                ScanEvent::HostComplete {
                    live_port, hits, ..
                } => {
                    if live_port.is_some() {
                        live_hits.extend(hits.clone());
                    }
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert_eq!(live_hits, report.hits);

        match &events[3] {
            ScanEvent::Complete(final_report) => assert_eq!(final_report.hits, report.hits),
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn custom_catalogs_drive_the_sweep() {
        let network = Arc::new(FakeNetwork::with(&[((10, 0, 0, 1), 7447, &["/stream1"])]));
        let config = ScanConfig {
            ports: PortCatalog::parse("7447").unwrap(),
            paths: PathCatalog::parse("/stream1,/stream2").unwrap(),
            ..ScanConfig::default()
        };
        let report = scan(&network, &config, "10.0.0.0/30").await.unwrap();
        assert_eq!(
            report.hits,
            vec![StreamHit::new(Ipv4Addr::new(10, 0, 0, 1), 7447, "/stream1")]
        );
    }
}
