use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Lightweight check that a node accepts connections
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LivenessProbe: Send + Sync + 'static {
    /// `addr`: "127.0.0.1:27117"
    async fn is_live(
        &self,
        addr: &str,
        probe_timeout: Duration,
    ) -> bool;
}

/// Considers a node live once a TCP connection to its port succeeds
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

#[async_trait]
impl LivenessProbe for TcpProbe {
    async fn is_live(
        &self,
        addr: &str,
        probe_timeout: Duration,
    ) -> bool {
        match timeout(probe_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                trace!("connect to {} failed: {}", addr, e);
                false
            }
            Err(_) => {
                trace!("connect to {} timed out after {:?}", addr, probe_timeout);
                false
            }
        }
    }
}
