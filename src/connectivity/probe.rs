use std::time::Duration;

use async_trait::async_trait;
use tokio::{net::TcpStream, time};

use crate::{log_debug, settings::ProbeSettings};

const ENABLE_LOGS: bool = false;

#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Reachable when a TCP handshake with a well-known host completes in time.
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn from_settings(settings: &ProbeSettings) -> Self {
        Self::new(
            settings.host.clone(),
            settings.port,
            Duration::from_millis(settings.timeout_ms),
        )
    }
}

#[async_trait]
impl ReachabilityProbe for TcpProbe {
    async fn is_reachable(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match time::timeout(self.timeout, connect).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                log_debug!("Probe {}:{} failed: {}", self.host, self.port, err);
                false
            }
            Err(_) => {
                log_debug!("Probe {}:{} timed out", self.host, self.port);
                false
            }
        }
    }
}
