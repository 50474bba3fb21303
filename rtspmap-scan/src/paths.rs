use std::net::Ipv4Addr;
use std::sync::Arc;

use rtspmap_types::{PathCatalog, RtspMethod};
use tracing::debug;

use crate::traits::Prober;

/// Walks the path catalog against a host/port that already answered OPTIONS.
///
/// Paths are probed one at a time so a single camera never sees more than
/// one outstanding request from us.
#[derive(Clone)]
pub struct PathDiscoverer {
    prober: Arc<dyn Prober>,
    paths: PathCatalog,
}

impl PathDiscoverer {
    pub fn new(prober: Arc<dyn Prober>, paths: PathCatalog) -> Self {
        Self { prober, paths }
    }

    pub fn prober(&self) -> &dyn Prober {
        &*self.prober
    }

    /// DESCRIBE every catalog path; return the valid ones in catalog order.
    ///
    /// An empty result means the host speaks RTSP but none of the known
    /// vendor paths apply.
    pub async fn discover_paths(&self, address: Ipv4Addr, port: u16) -> Vec<String> {
        let mut valid = Vec::new();
        for path in self.paths.iter() {
            let outcome = self
                .prober
                .probe(address, port, path, RtspMethod::Describe)
                .await;
            if outcome.is_valid() {
                valid.push(path.to_string());
            }
        }
        debug!(
            %address,
            port,
            found = valid.len(),
            catalog = self.paths.len(),
            "path discovery finished"
        );
        valid
    }
}
