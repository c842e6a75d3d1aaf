//! TCP reachability probe

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::ports::ReachabilityProbe;

/// Probes by opening (and immediately dropping) a TCP connection
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

impl TcpProbe {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReachabilityProbe for TcpProbe {
    async fn probe(&self, host: &str, port: u16, limit: Duration) -> bool {
        match timeout(limit, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                drop(stream);
                true
            }
            Ok(Err(e)) => {
                debug!(host = %host, port, error = %e, "Reachability probe failed");
                false
            }
            Err(_) => {
                debug!(host = %host, port, timeout_ms = limit.as_millis(), "Reachability probe timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(
            TcpProbe::new()
                .probe("127.0.0.1", port, Duration::from_secs(2))
                .await
        );
    }

    #[tokio::test]
    async fn test_probe_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(
            !TcpProbe::new()
                .probe("127.0.0.1", port, Duration::from_secs(2))
                .await
        );
    }

    #[tokio::test]
    async fn test_probe_unresolvable_host() {
        assert!(
            !TcpProbe::new()
                .probe("no-such-host.invalid", 22, Duration::from_secs(2))
                .await
        );
    }
}
