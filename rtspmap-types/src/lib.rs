pub mod catalog;
pub mod probe;
pub mod scan;
pub mod stream;

pub use catalog::{
    CatalogError, DEFAULT_RTSP_PATHS, DEFAULT_RTSP_PORTS, DEFAULT_SNAPSHOT_PATHS, PathCatalog,
    PortCatalog,
};
pub use probe::{ProbeFault, ProbeOutcome, RtspMethod};
pub use scan::{
    DEFAULT_PROBE_TIMEOUT, DEFAULT_READ_BUFFER_SIZE, DEFAULT_WORKERS, ScanConfig, ScanReport,
};
pub use stream::StreamHit;
