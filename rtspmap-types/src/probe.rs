use serde::{Deserialize, Serialize};
use std::fmt;

/// RTSP request methods used while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RtspMethod {
    /// Liveness check: does the port speak RTSP at all.
    Options,
    /// Path check: does the server know this stream path.
    Describe,
}

impl RtspMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Options => "OPTIONS",
            Self::Describe => "DESCRIBE",
        }
    }
}

impl fmt::Display for RtspMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a probe was classified invalid. Diagnostic only; callers branch on
/// [`ProbeOutcome::is_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFault {
    ConnectRefused,
    ConnectTimeout,
    /// Unreachable network, reset during connect, etc.
    ConnectFailed,
    WriteFailed,
    ReadTimeout,
    ReadFailed,
    /// Peer closed the connection without sending anything.
    EmptyReply,
    /// Peer replied, but not with RTSP.
    SignatureMissing,
    Cancelled,
}

impl fmt::Display for ProbeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectRefused => write!(f, "connection refused"),
            Self::ConnectTimeout => write!(f, "connect timeout"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::ReadTimeout => write!(f, "read timeout"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::EmptyReply => write!(f, "empty reply"),
            Self::SignatureMissing => write!(f, "no RTSP signature"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one request/response round-trip. There is no third state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Valid,
    Invalid(ProbeFault),
}

impl ProbeOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn fault(&self) -> Option<ProbeFault> {
        match self {
            Self::Valid => None,
            Self::Invalid(fault) => Some(*fault),
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid(fault) => write!(f, "invalid ({fault})"),
        }
    }
}
