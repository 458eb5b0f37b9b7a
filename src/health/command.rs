//! External check command probe.
//!
//! Runs a site-provided script the way the classic supervised check scripts
//! did: exit status 0 means the service is healthy, anything else is not.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::health::probe::{HealthProbe, ProbeError};

#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl HealthProbe for CommandProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        // kill_on_drop so a timed-out check does not outlive the deadline
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProbeError::Ambiguous(format!("cannot run {}: {}", self.program, e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        match output.status.code() {
            Some(code) if stderr.is_empty() => {
                Err(ProbeError::Failed(format!("{} exited with {}", self.program, code)))
            }
            Some(code) => Err(ProbeError::Failed(format!(
                "{} exited with {}: {}",
                self.program, code, stderr
            ))),
            None => Err(ProbeError::Ambiguous(format!(
                "{} terminated by signal",
                self.program
            ))),
        }
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            format!("command {}", self.program)
        } else {
            format!("command {} {}", self.program, self.args.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::run_probe;
    use std::time::Duration;

    #[tokio::test]
    async fn test_exit_zero_is_healthy() {
        let probe = CommandProbe::new("sh", vec!["-c".into(), "exit 0".into()]);
        assert_eq!(probe.check().await, Ok(()));
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let probe = CommandProbe::new("sh", vec!["-c".into(), "echo named down >&2; exit 3".into()]);
        assert_eq!(
            probe.check().await,
            Err(ProbeError::Failed("sh exited with 3: named down".into()))
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_ambiguous() {
        let probe = CommandProbe::new("/nonexistent/check", Vec::new());
        assert!(matches!(probe.check().await, Err(ProbeError::Ambiguous(_))));
    }

    #[tokio::test]
    async fn test_slow_command_times_out() {
        let probe = CommandProbe::new("sleep", vec!["5".into()]);
        let result = run_probe(&probe, Duration::from_millis(100)).await;
        assert!(!result.success);
    }
}
