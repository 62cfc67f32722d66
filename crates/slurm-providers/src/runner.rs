use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{ProviderError, Result};

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs an external program and hands back everything it wrote to stdout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, command: &str, args: &[String]) -> Result<Vec<u8>>;
}

/// Spawns real processes. A child that outlives the timeout is killed.
#[derive(Clone, Debug)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn execute(&self, command: &str, args: &[String]) -> Result<Vec<u8>> {
        debug!("running {command} {}", args.join(" "));

        let mut cmd = tokio::process::Command::new(command);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ProviderError::Timeout {
                command: command.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|e| ProviderError::Spawn {
                command: command.to_string(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Exit {
                command: command.to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let runner = SystemRunner::default();
        let err = runner
            .execute("slurm-providers-no-such-binary", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout() {
        let runner = SystemRunner::default();
        let out = runner
            .execute("sh", &["-c".to_string(), "printf 'board:gpu:4'".to_string()])
            .await
            .unwrap();
        assert_eq!(out, b"board:gpu:4");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_error() {
        let runner = SystemRunner::default();
        let err = runner
            .execute("sh", &["-c".to_string(), "echo broken >&2; exit 3".to_string()])
            .await
            .unwrap_err();
        match err {
            ProviderError::Exit { command, stderr, .. } => {
                assert_eq!(command, "sh");
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_command_times_out() {
        let runner = SystemRunner::new(Duration::from_millis(100));
        let err = runner
            .execute("sleep", &["5".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout { .. }));
    }
}
