mod connect;
pub mod paths;
pub mod rtsp;
mod traits;

pub use paths::PathDiscoverer;
pub use rtsp::{LIVENESS_PATH, RTSP_SIGNATURE, TcpRtspProber, build_request, classify_reply};
pub use traits::Prober;
