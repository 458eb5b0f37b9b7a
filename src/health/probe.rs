//! Probe contract and the bounded runner.

use std::time::{Duration, Instant, SystemTime};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::time;

use crate::observability::metrics;

/// Why a probe did not report success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    /// The service answered and the answer was bad.
    #[error("check failed: {0}")]
    Failed(String),

    /// Health could not be determined either way.
    #[error("ambiguous result: {0}")]
    Ambiguous(String),
}

/// One health check of the local service.
///
/// Implementations must be side-effect free. They may block for as long as
/// they like; [`run_probe`] enforces the deadline.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> Result<(), ProbeError>;

    /// Short human description for logs, e.g. `dns 127.0.0.1:53 localhost. A`.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: HealthProbe + ?Sized> HealthProbe for Box<T> {
    async fn check(&self) -> Result<(), ProbeError> {
        (**self).check().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Outcome of one bounded probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub success: bool,
    pub observed_at: SystemTime,
    pub elapsed: Duration,
    pub detail: Option<String>,
}

impl ProbeResult {
    pub fn healthy(elapsed: Duration) -> Self {
        Self {
            success: true,
            observed_at: SystemTime::now(),
            elapsed,
            detail: None,
        }
    }

    pub fn unhealthy(elapsed: Duration, error: &ProbeError) -> Self {
        Self {
            success: false,
            observed_at: SystemTime::now(),
            elapsed,
            detail: Some(error.to_string()),
        }
    }
}

/// Run `probe` under a hard deadline. Never fails: every error becomes an
/// unsuccessful [`ProbeResult`].
pub async fn run_probe<P: HealthProbe + ?Sized>(probe: &P, timeout: Duration) -> ProbeResult {
    let started = Instant::now();

    let outcome = match time::timeout(timeout, probe.check()).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ProbeError::Timeout(timeout)),
    };
    let elapsed = started.elapsed();

    let result = match outcome {
        Ok(()) => ProbeResult::healthy(elapsed),
        Err(e) => {
            tracing::warn!(probe = %probe.describe(), error = %e, "Health check failed");
            ProbeResult::unhealthy(elapsed, &e)
        }
    };

    metrics::record_probe(result.success, elapsed);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<(), ProbeError>);

    #[async_trait]
    impl HealthProbe for Fixed {
        async fn check(&self) -> Result<(), ProbeError> {
            self.0.clone()
        }

        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    struct Hang;

    #[async_trait]
    impl HealthProbe for Hang {
        async fn check(&self) -> Result<(), ProbeError> {
            std::future::pending().await
        }

        fn describe(&self) -> String {
            "hang".into()
        }
    }

    #[tokio::test]
    async fn test_success_maps_to_healthy() {
        let result = run_probe(&Fixed(Ok(())), Duration::from_secs(1)).await;
        assert!(result.success);
        assert!(result.detail.is_none());
    }

    #[tokio::test]
    async fn test_errors_map_to_unhealthy_with_detail() {
        let probe = Fixed(Err(ProbeError::Ambiguous("truncated reply".into())));
        let result = run_probe(&probe, Duration::from_secs(1)).await;
        assert!(!result.success);
        assert_eq!(
            result.detail.as_deref(),
            Some("ambiguous result: truncated reply")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_enforced() {
        let probe: Box<dyn HealthProbe> = Box::new(Hang);
        let result = run_probe(&probe, Duration::from_millis(500)).await;
        assert!(!result.success);
        assert!(result.detail.unwrap().starts_with("timed out"));
    }
}
