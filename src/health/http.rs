//! HTTP GET probe.

use std::time::Duration;

use async_trait::async_trait;

use crate::health::probe::{HealthProbe, ProbeError};
use crate::health::ProbeConfigError;

/// Healthy on a 2xx reply, or on exactly `expected_status` when set.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: String,
    expected_status: Option<u16>,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(
        url: impl Into<String>,
        expected_status: Option<u16>,
        timeout: Duration,
    ) -> Result<Self, ProbeConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .pool_max_idle_per_host(0)
            .user_agent("anycast-healthd")
            .build()
            .map_err(|e| ProbeConfigError(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            expected_status,
            client,
        })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_connect() {
                ProbeError::Connect(e.to_string())
            } else {
                ProbeError::Ambiguous(e.to_string())
            }
        })?;

        let status = response.status();
        let accepted = match self.expected_status {
            Some(expected) => status.as_u16() == expected,
            None => status.is_success(),
        };
        if accepted {
            Ok(())
        } else {
            Err(ProbeError::Failed(format!("{} returned {}", self.url, status)))
        }
    }

    fn describe(&self) -> String {
        format!("http {}", self.url)
    }
}
