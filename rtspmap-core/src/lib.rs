pub mod engine;
pub mod results;
pub mod target;

pub use engine::{EngineError, ScanEngine, ScanEvent};
pub use results::ResultSet;
pub use target::{TargetParseError, expand_cidr};
pub use tokio_util::sync::CancellationToken;
