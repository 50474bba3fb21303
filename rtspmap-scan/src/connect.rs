use rtspmap_types::ProbeFault;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

/// Connect to `addr`, giving up after `timeout`.
pub(crate) async fn connect_tcp(addr: SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
    tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timeout"))?
}

/// Map a connect error onto the probe diagnostic.
pub(crate) fn connect_fault(err: &io::Error) -> ProbeFault {
    match err.kind() {
        io::ErrorKind::TimedOut => ProbeFault::ConnectTimeout,
        io::ErrorKind::ConnectionRefused => ProbeFault::ConnectRefused,
        _ => ProbeFault::ConnectFailed,
    }
}
