use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use rtspmap_types::{
    DEFAULT_PROBE_TIMEOUT, DEFAULT_READ_BUFFER_SIZE, ProbeFault, ProbeOutcome, RtspMethod,
    ScanConfig,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connect::{connect_fault, connect_tcp};
use crate::traits::Prober;

/// Bytes that mark a reply as RTSP. Any status code counts.
pub const RTSP_SIGNATURE: &[u8] = b"RTSP";

/// Path used for the OPTIONS liveness probe.
pub const LIVENESS_PATH: &str = "/";

/// Build the single request sent by a probe.
pub fn build_request(address: Ipv4Addr, port: u16, path: &str, method: RtspMethod) -> String {
    format!("{method} rtsp://{address}:{port}{path} RTSP/1.0\r\nCSeq: 1\r\n\r\n")
}

/// Classify whatever came back from the single read.
pub fn classify_reply(reply: &[u8]) -> ProbeOutcome {
    if reply.is_empty() {
        ProbeOutcome::Invalid(ProbeFault::EmptyReply)
    } else if reply
        .windows(RTSP_SIGNATURE.len())
        .any(|window| window == RTSP_SIGNATURE)
    {
        ProbeOutcome::Valid
    } else {
        ProbeOutcome::Invalid(ProbeFault::SignatureMissing)
    }
}

/// Plain-TCP RTSP prober: connect, write one request, read once.
#[derive(Clone)]
pub struct TcpRtspProber {
    connect_timeout: Duration,
    read_timeout: Duration,
    read_buffer_size: usize,
    cancel: Option<CancellationToken>,
}

impl Default for TcpRtspProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT, DEFAULT_PROBE_TIMEOUT)
    }
}

impl TcpRtspProber {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            cancel: None,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.connect_timeout, config.read_timeout)
            .with_read_buffer_size(config.read_buffer_size)
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(RTSP_SIGNATURE.len());
        self
    }

    /// Outstanding connects and reads resolve to `Invalid(Cancelled)` as soon
    /// as `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    async fn exchange(
        &self,
        address: Ipv4Addr,
        port: u16,
        path: &str,
        method: RtspMethod,
    ) -> ProbeOutcome {
        let addr = SocketAddr::from((address, port));

        // The stream is dropped, and so closed, on every return below.
        let mut stream = match connect_tcp(addr, self.connect_timeout).await {
            Ok(stream) => stream,
            Err(e) => return ProbeOutcome::Invalid(connect_fault(&e)),
        };

        let request = build_request(address, port, path, method);
        match timeout(self.read_timeout, stream.write_all(request.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) | Err(_) => return ProbeOutcome::Invalid(ProbeFault::WriteFailed),
        }

        let mut buf = vec![0u8; self.read_buffer_size];
        match timeout(self.read_timeout, stream.read(&mut buf)).await {
            Ok(Ok(n)) => classify_reply(&buf[..n]),
            Ok(Err(_)) => ProbeOutcome::Invalid(ProbeFault::ReadFailed),
            Err(_) => ProbeOutcome::Invalid(ProbeFault::ReadTimeout),
        }
    }
}

#[async_trait]
impl Prober for TcpRtspProber {
    async fn probe(
        &self,
        address: Ipv4Addr,
        port: u16,
        path: &str,
        method: RtspMethod,
    ) -> ProbeOutcome {
        let outcome = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => ProbeOutcome::Invalid(ProbeFault::Cancelled),
                    outcome = self.exchange(address, port, path, method) => outcome,
                }
            }
            None => self.exchange(address, port, path, method).await,
        };
        debug!(%address, port, path, %method, %outcome, "rtsp probe");
        outcome
    }
}
