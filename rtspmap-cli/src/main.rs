mod args;
mod playback;
mod prompt;
mod select;
mod snapshot;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use args::Args;
use playback::{launch_player, stream_url};
use rtspmap_core::{CancellationToken, ScanEngine, ScanEvent};
use rtspmap_scan::TcpRtspProber;
use rtspmap_types::ScanReport;
use snapshot::SnapshotCapture;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing based on verbosity
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let scan_config = args.scan_config().context("invalid catalog override")?;

    let cidr = match args.cidr.clone() {
        Some(cidr) => cidr,
        None => prompt::ask(
            &mut io::stdin().lock(),
            &mut io::stderr(),
            "CIDR (e.g. 192.168.1.0/24): ",
        )?
        .context("no network given")?,
    };

    let interrupt = CancellationToken::new();
    spawn_interrupt_handler(interrupt.clone());

    let prober =
        Arc::new(TcpRtspProber::from_config(&scan_config).with_cancellation(interrupt.clone()));
    let (tx, mut rx) = mpsc::channel(64);
    let engine = tokio::spawn({
        let config = scan_config.clone();
        let cidr = cidr.clone();
        let cancel = interrupt.clone();
        async move { ScanEngine::run_streaming(&config, &cidr, prober, tx, cancel).await }
    });

    while let Some(event) = rx.recv().await {
        if let Some(line) = progress_line(&event) {
            eprintln!("{line}");
        }
    }

    let report = engine.await.context("scan task failed")??;
    // Scan finished; a further Ctrl+C ends the process.
    interrupt.cancel();

    match next_step(&report, args.json) {
        NextStep::PrintJson => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        NextStep::NothingFound => {
            println!("{NOTHING_FOUND}");
            return Ok(());
        }
        NextStep::Select => {}
    }

    info!(
        hits = report.hits.len(),
        hosts_live = report.hosts_live,
        "scan finished"
    );
    let hit = select::choose_stream(&report.hits, &mut io::stdin().lock(), &mut io::stdout())?
        .clone();

    let credentials = prompt::prompt_credentials(
        &mut io::stdin().lock(),
        &mut io::stdout(),
        prompt::read_password,
    )?;

    if !args.no_snapshot {
        println!("\ntrying HTTP snapshot...");
        match SnapshotCapture::new(args.snapshot_config()) {
            Ok(capture) => match capture.capture(hit.address(), credentials.as_ref()).await {
                Ok(file) => println!("{}", snapshot_saved_line(&file)),
                Err(e) => println!("{e}"),
            },
            Err(e) => warn!(error = %e, "snapshot client unavailable"),
        }
    }

    if !args.no_play {
        println!("\nopening {}", hit.url());
        let url = stream_url(&hit, credentials.as_ref());
        if let Err(e) = launch_player(&args.player(), &url).await {
            warn!(error = %e, "failed to launch player");
            eprintln!("could not start player: {e}");
        }
    }

    Ok(())
}

/// First Ctrl+C cancels a running scan; once the token is cancelled the
/// next one exits, since the installed handler replaces the default action.
fn spawn_interrupt_handler(interrupt: CancellationToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt.is_cancelled() {
                std::process::exit(130);
            }
            eprintln!("\ninterrupted, stopping scan...");
            interrupt.cancel();
        }
    });
}

const NOTHING_FOUND: &str = "no RTSP streams found";

/// What happens once the scan report is in.
#[derive(Debug, PartialEq, Eq)]
enum NextStep {
    PrintJson,
    /// No selection, snapshot or playback.
    NothingFound,
    Select,
}

fn next_step(report: &ScanReport, json: bool) -> NextStep {
    if json {
        NextStep::PrintJson
    } else if report.hits.is_empty() {
        NextStep::NothingFound
    } else {
        NextStep::Select
    }
}

/// Snapshot filenames carry a UTC time of day.
fn snapshot_saved_line(file: &Path) -> String {
    format!("snapshot saved (UTC timestamp): {}", file.display())
}

/// Human progress output for scan events. Dead hosts stay silent.
fn progress_line(event: &ScanEvent) -> Option<String> {
    match event {
        ScanEvent::Started {
            network,
            hosts_total,
            workers,
        } => Some(format!(
            "scanning {hosts_total} hosts in {network} ({workers} workers)..."
        )),
        ScanEvent::HostComplete {
            address,
            live_port: Some(port),
            hits,
            hosts_completed,
            hosts_total,
        } => Some(format!(
            "[{hosts_completed}/{hosts_total}] {address}:{port} speaks RTSP, {} stream path(s)",
            hits.len()
        )),
        ScanEvent::HostComplete { .. } | ScanEvent::Complete(_) => None,
    }
}
