//! TCP connect probe.

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::health::probe::{HealthProbe, ProbeError};

/// Healthy when a TCP connection to `target` is accepted.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    target: String,
}

impl TcpProbe {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[async_trait]
impl HealthProbe for TcpProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        TcpStream::connect(&self.target)
            .await
            .map(drop)
            .map_err(|e| ProbeError::Connect(format!("{}: {}", self.target, e)))
    }

    fn describe(&self) -> String {
        format!("tcp {}", self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_listening_port_is_healthy() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let probe = TcpProbe::new(listener.local_addr().unwrap().to_string());
        assert_eq!(probe.check().await, Ok(()));
    }

    #[tokio::test]
    async fn test_closed_port_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = TcpProbe::new(addr.to_string());
        assert!(matches!(probe.check().await, Err(ProbeError::Connect(_))));
    }
}
