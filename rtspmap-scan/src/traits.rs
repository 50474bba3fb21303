use async_trait::async_trait;
use rtspmap_types::{ProbeOutcome, RtspMethod};
use std::net::Ipv4Addr;

/// One RTSP request/response exchange against `address:port`.
///
/// Implementations must contain every network fault and always return a
/// definite outcome. No retries.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(
        &self,
        address: Ipv4Addr,
        port: u16,
        path: &str,
        method: RtspMethod,
    ) -> ProbeOutcome;
}
